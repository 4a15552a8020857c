//! フレームごとの姿勢チャンネル計算
//!
//! 行きがけ順トラバースの各ジョイントで、基底ルールから
//! ワールド回転を求め、親相対回転のオイラー角に落とす。

use nalgebra::{UnitQuaternion, Vector3};
use tracing::warn;

use crate::error::ConvertError;
use crate::math;
use crate::pose::PoseSequence;
use crate::skeleton::{BasisRule, Skeleton};

/// 1フレーム分のモーションチャンネルを計算する
///
/// チャンネル順は `Skeleton::preorder` からエンドサイトを除いた列で、
/// 先頭にルート並進3チャンネルが付く。階層出力と同じ順序になる。
///
/// 基底が縮退した場合は親の姿勢（ルートなら恒等回転）へフォールバックし、
/// `fallbacks` を加算する。1ジョイントの縮退でフレーム全体を失わないため。
pub fn frame_channels(
    skeleton: &Skeleton,
    poses: &PoseSequence,
    frame: usize,
    root_translation: Vector3<f32>,
    fallbacks: &mut u64,
) -> Result<Vec<f32>, ConvertError> {
    let mut channel = Vec::with_capacity(skeleton.channels_per_frame());
    let mut world: Vec<Option<UnitQuaternion<f32>>> = vec![None; skeleton.len()];

    for i in skeleton.preorder() {
        let joint = skeleton.joint(i);
        if joint.end_site {
            continue;
        }
        if joint.parent.is_none() {
            channel.extend([root_translation.x, root_translation.y, root_translation.z]);
        }

        let parent_world = joint
            .parent
            .map(|p| world[p].unwrap_or_else(UnitQuaternion::identity));

        let quat = match &joint.rule {
            BasisRule::InheritParent => parent_world.unwrap_or_else(UnitQuaternion::identity),
            BasisRule::Axes { x, y, z, priority } => {
                let dir = |d: &Option<(usize, usize)>| {
                    d.map(|(a, b)| poses.point(frame, a) - poses.point(frame, b))
                };
                match math::axes_from_directions(dir(x), dir(y), dir(z), *priority) {
                    Ok(m) => math::matrix_to_quaternion(&m),
                    Err(ConvertError::DegenerateAxis) => {
                        warn!(frame, joint = joint.name, "degenerate basis, inheriting parent pose");
                        *fallbacks += 1;
                        parent_world.unwrap_or_else(UnitQuaternion::identity)
                    }
                    Err(e) => return Err(e),
                }
            }
        };
        world[i] = Some(quat);

        let local = match parent_world {
            Some(parent) => math::relative_quaternion(&quat, &parent),
            None => quat,
        };
        let order = joint
            .order
            .ok_or_else(|| ConvertError::SkeletonDefinition(format!(
                "joint {} has no rotation order",
                joint.name
            )))?;
        channel.extend(math::quaternion_to_euler_deg(&local, order));
    }

    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::openpose;
    use ndarray::Array3;

    /// 正面向き直立のOpenPoseポーズ
    fn upright_pose() -> PoseSequence {
        let mut data = Array3::<f32>::zeros((1, openpose::KEYPOINT_COUNT, 3));
        let mut set = |kp: usize, x: f32, y: f32, z: f32| {
            data[(0, kp, 0)] = x;
            data[(0, kp, 1)] = y;
            data[(0, kp, 2)] = z;
        };
        set(openpose::MID_HIP, 0.0, 0.0, 1.0);
        set(openpose::NECK, 0.0, 0.0, 1.6);
        set(openpose::NOSE, 0.0, -0.1, 1.75);
        set(openpose::R_EYE, -0.05, -0.12, 1.8);
        set(openpose::L_EYE, 0.05, -0.12, 1.8);
        set(openpose::R_EAR, -0.1, -0.05, 1.78);
        set(openpose::L_EAR, 0.1, -0.05, 1.78);
        set(openpose::R_SHOULDER, -0.2, 0.0, 1.55);
        set(openpose::R_ELBOW, -0.45, 0.0, 1.55);
        set(openpose::R_WRIST, -0.7, 0.0, 1.55);
        set(openpose::L_SHOULDER, 0.2, 0.0, 1.55);
        set(openpose::L_ELBOW, 0.45, 0.0, 1.55);
        set(openpose::L_WRIST, 0.7, 0.0, 1.55);
        set(openpose::R_HIP, -0.1, 0.0, 1.0);
        set(openpose::R_KNEE, -0.1, 0.0, 0.5);
        set(openpose::R_ANKLE, -0.1, 0.0, 0.1);
        set(openpose::L_HIP, 0.1, 0.0, 1.0);
        set(openpose::L_KNEE, 0.1, 0.0, 0.5);
        set(openpose::L_ANKLE, 0.1, 0.0, 0.1);
        set(openpose::R_BIG_TOE, -0.1, -0.15, 0.0);
        set(openpose::R_SMALL_TOE, -0.15, -0.13, 0.0);
        set(openpose::R_HEEL, -0.1, 0.05, 0.0);
        set(openpose::L_BIG_TOE, 0.1, -0.15, 0.0);
        set(openpose::L_SMALL_TOE, 0.15, -0.13, 0.0);
        set(openpose::L_HEEL, 0.1, 0.05, 0.0);
        PoseSequence::new(data).unwrap()
    }

    #[test]
    fn test_channel_count_matches_skeleton() {
        let skel = openpose().unwrap();
        let poses = upright_pose();
        let mut fallbacks = 0;
        let channel = frame_channels(
            &skel,
            &poses,
            0,
            Vector3::new(1.0, 2.0, 0.0),
            &mut fallbacks,
        )
        .unwrap();
        assert_eq!(channel.len(), skel.channels_per_frame());
    }

    #[test]
    fn test_root_translation_leads_channel() {
        let skel = openpose().unwrap();
        let poses = upright_pose();
        let mut fallbacks = 0;
        let channel = frame_channels(
            &skel,
            &poses,
            0,
            Vector3::new(7.0, -3.0, 0.5),
            &mut fallbacks,
        )
        .unwrap();
        assert_eq!(&channel[..3], &[7.0, -3.0, 0.5]);
    }

    #[test]
    fn test_deterministic() {
        let skel = openpose().unwrap();
        let poses = upright_pose();
        let mut f1 = 0;
        let mut f2 = 0;
        let a = frame_channels(&skel, &poses, 0, Vector3::zeros(), &mut f1).unwrap();
        let b = frame_channels(&skel, &poses, 0, Vector3::zeros(), &mut f2).unwrap();
        assert_eq!(a, b);
        assert_eq!(f1, f2);
    }

    #[test]
    fn test_finite_angles() {
        let skel = openpose().unwrap();
        let poses = upright_pose();
        let mut fallbacks = 0;
        let channel =
            frame_channels(&skel, &poses, 0, Vector3::zeros(), &mut fallbacks).unwrap();
        assert!(channel.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_degenerate_frame_falls_back() {
        let skel = openpose().unwrap();
        // 全キーポイント同一位置 → 全基底が縮退
        let data = Array3::<f32>::ones((1, openpose::KEYPOINT_COUNT, 3));
        let poses = PoseSequence::new(data).unwrap();
        let mut fallbacks = 0;
        let channel =
            frame_channels(&skel, &poses, 0, Vector3::zeros(), &mut fallbacks).unwrap();
        assert_eq!(channel.len(), skel.channels_per_frame());
        assert!(fallbacks > 0);
        // 全ジョイントが恒等回転へフォールバック → 角度は全てゼロ
        assert!(channel[3..].iter().all(|v| v.abs() < 1e-4));
    }
}
