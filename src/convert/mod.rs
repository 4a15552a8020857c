//! ポーズ列からBVHドキュメントへの変換パイプライン
//!
//! 入力検証 → オフセット推定 → フレームごとのチャンネル計算の順で、
//! 入力を変更せず新しいドキュメントを構築する。同一入力からは
//! 常にビット単位で同一の結果が得られる。

pub mod channels;
pub mod offsets;

use nalgebra::Vector3;
use tracing::{debug, info};

use crate::bvh::BvhDocument;
use crate::config::{Config, RootMotionConfig};
use crate::error::ConvertError;
use crate::pose::{PoseSequence, RootMotionTrack};
use crate::skeleton::Skeleton;

/// 正規化ルート座標[0,1]を出力空間へ線形リスケールする
/// Z（前後）は常に0に固定し、水平移動と高さだけを残す
pub fn rescale_root(norm: Vector3<f32>, cfg: &RootMotionConfig) -> Vector3<f32> {
    Vector3::new(
        norm.x * (cfg.x_max - cfg.x_min) + cfg.x_min,
        norm.y * (cfg.y_max - cfg.y_min) + cfg.y_min,
        0.0,
    )
}

/// ポーズ列全体をBVHドキュメントへ変換する
pub fn poses_to_bvh(
    skeleton: &Skeleton,
    poses: &PoseSequence,
    root_track: &RootMotionTrack,
    fps: f32,
    config: &Config,
) -> Result<BvhDocument, ConvertError> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(ConvertError::InvalidFps(fps));
    }
    if poses.frame_count() != root_track.frame_count() {
        return Err(ConvertError::FrameCountMismatch {
            poses: poses.frame_count(),
            root_track: root_track.frame_count(),
        });
    }
    if let Some(max) = skeleton.max_keypoint() {
        if max >= poses.joint_count() {
            return Err(ConvertError::KeypointOutOfRange {
                keypoint: max,
                available: poses.joint_count(),
            });
        }
    }

    info!(
        variant = skeleton.variant(),
        frames = poses.frame_count(),
        keypoints = poses.joint_count(),
        fps,
        "converting pose sequence"
    );

    let offsets = offsets::estimate_offsets(skeleton, poses, &config.offsets)?;

    let mut fallbacks: u64 = 0;
    let mut frames = Vec::with_capacity(poses.frame_count());
    for frame in 0..poses.frame_count() {
        let translation = rescale_root(root_track.point(frame), &config.root_motion);
        frames.push(channels::frame_channels(
            skeleton,
            poses,
            frame,
            translation,
            &mut fallbacks,
        )?);
    }

    if fallbacks > 0 {
        debug!(fallbacks, "degenerate bases encountered during conversion");
    }

    Ok(BvhDocument {
        skeleton: skeleton.clone(),
        offsets,
        frames,
        fps,
        fallback_count: fallbacks,
    })
}
