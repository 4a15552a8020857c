//! OpenPose 25キーポイントリグ定義
//!
//! 全ジョイントがソースキーポイントに1対1対応する。エンドサイトは
//! 宣言せず、末端ジョイントの姿勢は親方向から推定する。

use super::{BasisSpec, JointSpec, PointRef, Skeleton};
use crate::error::ConvertError;
use crate::math::RotationOrder;

/// ポーズ列のキーポイント割り当て
pub const NOSE: usize = 0;
pub const NECK: usize = 1;
pub const R_SHOULDER: usize = 2;
pub const R_ELBOW: usize = 3;
pub const R_WRIST: usize = 4;
pub const L_SHOULDER: usize = 5;
pub const L_ELBOW: usize = 6;
pub const L_WRIST: usize = 7;
pub const MID_HIP: usize = 8;
pub const R_HIP: usize = 9;
pub const R_KNEE: usize = 10;
pub const R_ANKLE: usize = 11;
pub const L_HIP: usize = 12;
pub const L_KNEE: usize = 13;
pub const L_ANKLE: usize = 14;
pub const R_EYE: usize = 15;
pub const L_EYE: usize = 16;
pub const R_EAR: usize = 17;
pub const L_EAR: usize = 18;
pub const L_BIG_TOE: usize = 19;
pub const L_SMALL_TOE: usize = 20;
pub const L_HEEL: usize = 21;
pub const R_BIG_TOE: usize = 22;
pub const R_SMALL_TOE: usize = 23;
pub const R_HEEL: usize = 24;

/// 必要なキーポイント数
pub const KEYPOINT_COUNT: usize = 25;

// 回転チャンネルはZXY順で出力するが、基底の再直交化はZ軸
// （ボーン方向）を最優先する
const ORDER: RotationOrder = RotationOrder::Zxy;
const PRIORITY: RotationOrder = RotationOrder::Zyx;

/// 最初の子へ向かうボーン方向だけで基底を決めるジョイント
const fn toward_child(
    name: &'static str,
    keypoint: usize,
    children: &'static [&'static str],
    direction: [f32; 3],
) -> JointSpec {
    JointSpec {
        name,
        keypoint: Some(keypoint),
        children,
        direction,
        order: Some(ORDER),
        end_site: false,
        basis: BasisSpec::Axes {
            x: None,
            y: None,
            z: Some((PointRef::Own, PointRef::Child)),
            priority: PRIORITY,
        },
    }
}

/// 子を持たない末端: 親から自分へのボーン方向を使う
const fn toward_parent(name: &'static str, keypoint: usize, direction: [f32; 3]) -> JointSpec {
    JointSpec {
        name,
        keypoint: Some(keypoint),
        children: &[],
        direction,
        order: Some(ORDER),
        end_site: false,
        basis: BasisSpec::Axes {
            x: None,
            y: None,
            z: Some((PointRef::Own, PointRef::Parent)),
            priority: PRIORITY,
        },
    }
}

static SPECS: &[JointSpec] = &[
    JointSpec {
        name: "MidHip",
        keypoint: Some(MID_HIP),
        children: &["Neck", "RHip", "LHip"],
        direction: [0.0, 0.0, 0.0],
        order: Some(ORDER),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Joint("LHip"), PointRef::Joint("RHip"))),
            y: None,
            z: Some((PointRef::Joint("Neck"), PointRef::Own)),
            priority: PRIORITY,
        },
    },
    // 体幹・頭部
    toward_child("Neck", NECK, &["Nose", "RShoulder", "LShoulder"], [0.0, 0.0, 1.0]),
    toward_child("Nose", NOSE, &["REye", "LEye"], [0.0, 0.0, 1.0]),
    toward_child("REye", R_EYE, &["REar"], [0.0, 1.0, 0.0]),
    toward_parent("REar", R_EAR, [0.0, 1.0, 0.0]),
    toward_child("LEye", L_EYE, &["LEar"], [0.0, 1.0, 0.0]),
    toward_parent("LEar", L_EAR, [0.0, 1.0, 0.0]),
    // 右腕
    toward_child("RShoulder", R_SHOULDER, &["RElbow"], [1.0, 0.0, 0.0]),
    toward_child("RElbow", R_ELBOW, &["RWrist"], [1.0, 0.0, 0.0]),
    toward_parent("RWrist", R_WRIST, [1.0, 0.0, 0.0]),
    // 左腕
    toward_child("LShoulder", L_SHOULDER, &["LElbow"], [-1.0, 0.0, 0.0]),
    toward_child("LElbow", L_ELBOW, &["LWrist"], [-1.0, 0.0, 0.0]),
    toward_parent("LWrist", L_WRIST, [-1.0, 0.0, 0.0]),
    // 右脚
    toward_child("RHip", R_HIP, &["RKnee"], [1.0, 0.0, 0.0]),
    toward_child("RKnee", R_KNEE, &["RAnkle"], [1.0, 0.0, 0.0]),
    toward_child("RAnkle", R_ANKLE, &["RBigToe", "RSmallToe", "RHeel"], [1.0, 0.0, 0.0]),
    toward_parent("RBigToe", R_BIG_TOE, [1.0, 0.0, 0.0]),
    toward_parent("RSmallToe", R_SMALL_TOE, [1.0, 0.0, 0.0]),
    toward_parent("RHeel", R_HEEL, [1.0, 0.0, 0.0]),
    // 左脚
    toward_child("LHip", L_HIP, &["LKnee"], [-1.0, 0.0, 0.0]),
    toward_child("LKnee", L_KNEE, &["LAnkle"], [-1.0, 0.0, 0.0]),
    toward_child("LAnkle", L_ANKLE, &["LBigToe", "LSmallToe", "LHeel"], [-1.0, 0.0, 0.0]),
    toward_parent("LBigToe", L_BIG_TOE, [-1.0, 0.0, 0.0]),
    toward_parent("LSmallToe", L_SMALL_TOE, [-1.0, 0.0, 0.0]),
    toward_parent("LHeel", L_HEEL, [-1.0, 0.0, 0.0]),
];

/// OpenPoseリグを構築する
pub fn openpose() -> Result<Skeleton, ConvertError> {
    Skeleton::from_specs("openpose", SPECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::BasisRule;

    #[test]
    fn test_openpose_builds() {
        let skel = openpose().unwrap();
        assert_eq!(skel.len(), 25);
        assert_eq!(skel.joint(skel.root()).name, "MidHip");
    }

    #[test]
    fn test_openpose_no_end_sites() {
        let skel = openpose().unwrap();
        assert!(skel.joints().iter().all(|j| !j.end_site));
        assert_eq!(skel.channel_joint_count(), 25);
        assert_eq!(skel.channels_per_frame(), 78);
    }

    #[test]
    fn test_openpose_keypoint_range() {
        let skel = openpose().unwrap();
        assert_eq!(skel.max_keypoint(), Some(KEYPOINT_COUNT - 1));
    }

    #[test]
    fn test_openpose_leaf_rule_uses_parent() {
        let skel = openpose().unwrap();
        let wrist = skel.index_of("RWrist").unwrap();
        match &skel.joint(wrist).rule {
            BasisRule::Axes { x, y, z, .. } => {
                assert_eq!(*x, None);
                assert_eq!(*y, None);
                assert_eq!(*z, Some((R_WRIST, R_ELBOW)));
            }
            other => panic!("unexpected rule: {other:?}"),
        }
    }

    #[test]
    fn test_openpose_channel_order_is_zxy() {
        let skel = openpose().unwrap();
        for joint in skel.joints() {
            assert_eq!(joint.order, Some(RotationOrder::Zxy));
        }
    }
}
