//! レストポーズのオフセット推定
//!
//! 各ボーン長をポーズ列全体の平均から推定し、定義テーブルの
//! Tポーズ方向に掛けてオフセットベクトルを得る。単一フレームの
//! ノイズに引きずられないよう必ず全フレームで平均する。

use nalgebra::Vector3;

use crate::config::OffsetConfig;
use crate::error::ConvertError;
use crate::math;
use crate::pose::PoseSequence;
use crate::skeleton::Skeleton;

/// ジョイントごとのボーン長を推定する
///
/// - ルート: 0
/// - 仮想ジョイント・エンドサイト: 設定のフォールバック定数
/// - 実キーポイント持ち: 実効親キーポイントとの距離の全フレーム平均
///
/// 推定後、左右対称なジョイント対は両者の平均長に揃える。
/// 片側だけ推定が荒れても出力リグが非対称に歪まないようにするため。
pub fn estimate_bone_lengths(
    skeleton: &Skeleton,
    poses: &PoseSequence,
    cfg: &OffsetConfig,
) -> Result<Vec<f32>, ConvertError> {
    let frame_count = poses.frame_count();
    let available = poses.joint_count();
    let mut lengths = vec![cfg.default_bone_length; skeleton.len()];

    for (i, joint) in skeleton.joints().iter().enumerate() {
        if i == skeleton.root() {
            lengths[i] = 0.0;
            continue;
        }
        let kp = match joint.keypoint {
            Some(kp) => kp,
            None => {
                lengths[i] = cfg.virtual_bone_length;
                continue;
            }
        };
        let parent = match skeleton.parent_of(i) {
            Some(p) => p,
            None => continue,
        };
        let parent_kp = match skeleton.effective_keypoint(parent) {
            Some(kp) => kp,
            None => continue,
        };
        for k in [kp, parent_kp] {
            if k >= available {
                return Err(ConvertError::KeypointOutOfRange {
                    keypoint: k,
                    available,
                });
            }
        }
        let sum: f32 = (0..frame_count)
            .map(|f| (poses.point(f, parent_kp) - poses.point(f, kp)).norm())
            .sum();
        lengths[i] = sum / frame_count as f32;
    }

    // 左右対称化
    let raw = lengths.clone();
    for (i, joint) in skeleton.joints().iter().enumerate() {
        if let Some(mirror) = Skeleton::mirror_name(joint.name) {
            if let Some(m) = skeleton.index_of(&mirror) {
                lengths[i] = (raw[i] + raw[m]) / 2.0;
            }
        }
    }

    Ok(lengths)
}

/// レストポーズのオフセットベクトルを推定する
/// 方向がゼロのジョイント（ルート等）はゼロオフセット
pub fn estimate_offsets(
    skeleton: &Skeleton,
    poses: &PoseSequence,
    cfg: &OffsetConfig,
) -> Result<Vec<Vector3<f32>>, ConvertError> {
    let lengths = estimate_bone_lengths(skeleton, poses, cfg)?;
    let mut offsets = Vec::with_capacity(skeleton.len());
    for (i, joint) in skeleton.joints().iter().enumerate() {
        let offset = match math::normalize(joint.direction) {
            Ok(dir) => dir * lengths[i],
            Err(_) => Vector3::zeros(),
        };
        offsets.push(offset);
    }
    Ok(offsets)
}
