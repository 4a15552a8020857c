//! CMUリグ定義
//!
//! 17キーポイントの入力を38ジョイントのCMUモーションキャプチャ
//! リグへ写像する。背骨の細分・肩・手指などはソースデータに
//! 対応点を持たない仮想ジョイントで、親の姿勢を継承する。

use super::{BasisSpec, JointSpec, PointRef, Skeleton};
use crate::error::ConvertError;
use crate::math::RotationOrder;

const ZYX: RotationOrder = RotationOrder::Zyx;

const fn virtual_joint(
    name: &'static str,
    children: &'static [&'static str],
    direction: [f32; 3],
) -> JointSpec {
    JointSpec {
        name,
        keypoint: None,
        children,
        direction,
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::InheritParent,
    }
}

const fn end_site(name: &'static str, direction: [f32; 3]) -> JointSpec {
    JointSpec {
        name,
        keypoint: None,
        children: &[],
        direction,
        order: None,
        end_site: true,
        basis: BasisSpec::InheritParent,
    }
}

/// ポーズ列のキーポイント割り当て
pub const HIPS: usize = 0;
pub const RIGHT_UP_LEG: usize = 1;
pub const RIGHT_LEG: usize = 2;
pub const RIGHT_FOOT: usize = 3;
pub const LEFT_UP_LEG: usize = 4;
pub const LEFT_LEG: usize = 5;
pub const LEFT_FOOT: usize = 6;
pub const SPINE: usize = 7;
pub const SPINE1: usize = 8;
pub const NECK1: usize = 9;
pub const HEAD: usize = 10;
pub const LEFT_ARM: usize = 11;
pub const LEFT_FORE_ARM: usize = 12;
pub const LEFT_HAND: usize = 13;
pub const RIGHT_ARM: usize = 14;
pub const RIGHT_FORE_ARM: usize = 15;
pub const RIGHT_HAND: usize = 16;

/// 必要なキーポイント数
pub const KEYPOINT_COUNT: usize = 17;

static SPECS: &[JointSpec] = &[
    JointSpec {
        name: "Hips",
        keypoint: Some(HIPS),
        children: &["LHipJoint", "RHipJoint", "LowerBack"],
        direction: [0.0, 0.0, 0.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Joint("LeftUpLeg"), PointRef::Joint("RightUpLeg"))),
            y: None,
            z: Some((PointRef::Joint("Spine"), PointRef::Own)),
            priority: ZYX,
        },
    },
    // 右脚
    virtual_joint("RHipJoint", &["RightUpLeg"], [0.0, 0.0, 0.0]),
    JointSpec {
        name: "RightUpLeg",
        keypoint: Some(RIGHT_UP_LEG),
        children: &["RightLeg"],
        direction: [-1.0, 0.0, 0.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Joint("Hips"), PointRef::Joint("RightUpLeg"))),
            y: None,
            z: Some((PointRef::Own, PointRef::Child)),
            priority: ZYX,
        },
    },
    JointSpec {
        name: "RightLeg",
        keypoint: Some(RIGHT_LEG),
        children: &["RightFoot"],
        direction: [0.0, 0.0, -1.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Joint("Hips"), PointRef::Joint("RightUpLeg"))),
            y: None,
            z: Some((PointRef::Own, PointRef::Child)),
            priority: ZYX,
        },
    },
    JointSpec {
        name: "RightFoot",
        keypoint: Some(RIGHT_FOOT),
        children: &["RightToeBase"],
        direction: [0.0, 0.0, -1.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::InheritParent,
    },
    virtual_joint("RightToeBase", &["RightToeBase_End"], [0.0, -1.0, 0.0]),
    end_site("RightToeBase_End", [0.0, 0.0, 1.0]),
    // 左脚
    virtual_joint("LHipJoint", &["LeftUpLeg"], [0.0, 0.0, 0.0]),
    JointSpec {
        name: "LeftUpLeg",
        keypoint: Some(LEFT_UP_LEG),
        children: &["LeftLeg"],
        direction: [1.0, 0.0, 0.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Joint("LeftUpLeg"), PointRef::Joint("Hips"))),
            y: None,
            z: Some((PointRef::Own, PointRef::Child)),
            priority: ZYX,
        },
    },
    JointSpec {
        name: "LeftLeg",
        keypoint: Some(LEFT_LEG),
        children: &["LeftFoot"],
        direction: [0.0, 0.0, -1.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Joint("LeftUpLeg"), PointRef::Joint("Hips"))),
            y: None,
            z: Some((PointRef::Own, PointRef::Child)),
            priority: ZYX,
        },
    },
    JointSpec {
        name: "LeftFoot",
        keypoint: Some(LEFT_FOOT),
        children: &["LeftToeBase"],
        direction: [0.0, 0.0, -1.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::InheritParent,
    },
    virtual_joint("LeftToeBase", &["LeftToeBase_End"], [0.0, -1.0, 0.0]),
    end_site("LeftToeBase_End", [0.0, 0.0, 1.0]),
    // 体幹
    virtual_joint("LowerBack", &["Spine"], [0.0, 0.0, 0.0]),
    JointSpec {
        name: "Spine",
        keypoint: Some(SPINE),
        children: &["Spine1"],
        direction: [0.0, 0.0, 1.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Joint("LeftUpLeg"), PointRef::Joint("RightUpLeg"))),
            y: None,
            z: Some((PointRef::Joint("Spine1"), PointRef::Own)),
            priority: ZYX,
        },
    },
    JointSpec {
        name: "Spine1",
        keypoint: Some(SPINE1),
        children: &["Neck", "LeftShoulder", "RightShoulder"],
        direction: [0.0, 0.0, 1.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Joint("LeftArm"), PointRef::Joint("RightArm"))),
            y: None,
            z: Some((PointRef::Own, PointRef::Joint("Spine"))),
            priority: ZYX,
        },
    },
    // 首・頭
    virtual_joint("Neck", &["Neck1"], [0.0, 0.0, 0.0]),
    JointSpec {
        name: "Neck1",
        keypoint: Some(NECK1),
        children: &["Head"],
        direction: [0.0, 0.0, 1.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: None,
            y: Some((PointRef::Joint("Spine1"), PointRef::Own)),
            z: Some((PointRef::Joint("Head"), PointRef::Joint("Spine1"))),
            priority: ZYX,
        },
    },
    JointSpec {
        name: "Head",
        keypoint: Some(HEAD),
        children: &["Head_End"],
        direction: [0.0, 0.0, 1.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::InheritParent,
    },
    end_site("Head_End", [0.0, 1.0, -0.2]),
    // 左腕
    virtual_joint("LeftShoulder", &["LeftArm"], [0.0, 0.0, 0.0]),
    JointSpec {
        name: "LeftArm",
        keypoint: Some(LEFT_ARM),
        children: &["LeftForeArm"],
        direction: [1.0, 0.0, 0.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Joint("LeftForeArm"), PointRef::Own)),
            y: Some((PointRef::Joint("LeftForeArm"), PointRef::Joint("LeftHand"))),
            z: None,
            priority: ZYX,
        },
    },
    JointSpec {
        name: "LeftForeArm",
        keypoint: Some(LEFT_FORE_ARM),
        children: &["LeftHand"],
        direction: [1.0, 0.0, 0.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Joint("LeftHand"), PointRef::Own)),
            y: Some((PointRef::Own, PointRef::Joint("LeftArm"))),
            z: None,
            priority: ZYX,
        },
    },
    JointSpec {
        name: "LeftHand",
        keypoint: Some(LEFT_HAND),
        children: &["LeftFingerBase", "LThumb"],
        direction: [1.0, 0.0, 0.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::InheritParent,
    },
    virtual_joint("LeftFingerBase", &["LeftHandIndex1"], [0.0, 0.0, 0.0]),
    virtual_joint("LeftHandIndex1", &["LeftHandIndex1_End"], [1.0, 0.0, 0.0]),
    end_site("LeftHandIndex1_End", [1.0, 0.0, 0.0]),
    virtual_joint("LThumb", &["LThumb_End"], [1.0, 0.0, 0.0]),
    end_site("LThumb_End", [1.0, 0.0, 1.0]),
    // 右腕
    virtual_joint("RightShoulder", &["RightArm"], [0.0, 0.0, 0.0]),
    JointSpec {
        name: "RightArm",
        keypoint: Some(RIGHT_ARM),
        children: &["RightForeArm"],
        direction: [-1.0, 0.0, 0.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Own, PointRef::Joint("RightForeArm"))),
            y: Some((PointRef::Joint("RightForeArm"), PointRef::Joint("RightHand"))),
            z: None,
            priority: ZYX,
        },
    },
    JointSpec {
        name: "RightForeArm",
        keypoint: Some(RIGHT_FORE_ARM),
        children: &["RightHand"],
        direction: [-1.0, 0.0, 0.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::Axes {
            x: Some((PointRef::Own, PointRef::Joint("RightHand"))),
            y: Some((PointRef::Own, PointRef::Joint("RightArm"))),
            z: None,
            priority: ZYX,
        },
    },
    JointSpec {
        name: "RightHand",
        keypoint: Some(RIGHT_HAND),
        children: &["RightFingerBase", "RThumb"],
        direction: [-1.0, 0.0, 0.0],
        order: Some(ZYX),
        end_site: false,
        basis: BasisSpec::InheritParent,
    },
    virtual_joint("RightFingerBase", &["RightHandIndex1"], [0.0, 0.0, 0.0]),
    virtual_joint("RightHandIndex1", &["RightHandIndex1_End"], [-1.0, 0.0, 0.0]),
    end_site("RightHandIndex1_End", [-1.0, 0.0, 0.0]),
    virtual_joint("RThumb", &["RThumb_End"], [-1.0, 0.0, 0.0]),
    end_site("RThumb_End", [-1.0, 0.0, 1.0]),
];

/// CMUリグを構築する
/// テーブルは静的に検証可能なのでエラーは定義ミスを意味する
pub fn cmu() -> Result<Skeleton, ConvertError> {
    Skeleton::from_specs("cmu", SPECS)
}
