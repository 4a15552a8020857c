use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

use crate::error::ConvertError;

/// 正規化を許容する最小ノルム
/// これ未満のベクトルは縮退扱い（NaN/Infを黙って伝播させない）
const MIN_NORM: f32 = 1e-6;

/// ジンバルロック判定の閾値 (|sinβ| がこれ以上なら ±90°)
const GIMBAL_EPS: f32 = 1e-6;

/// オイラー角の回転順序
///
/// BVHの回転チャンネル順と一致する。Zyx なら
/// `Zrotation Yrotation Xrotation` の3チャンネルを意味し、
/// 回転行列は R = Rz(θ0)・Ry(θ1)・Rx(θ2) と分解される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOrder {
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

impl RotationOrder {
    /// 軸インデックス列 (x=0, y=1, z=2)
    pub fn indices(self) -> [usize; 3] {
        match self {
            RotationOrder::Xyz => [0, 1, 2],
            RotationOrder::Xzy => [0, 2, 1],
            RotationOrder::Yxz => [1, 0, 2],
            RotationOrder::Yzx => [1, 2, 0],
            RotationOrder::Zxy => [2, 0, 1],
            RotationOrder::Zyx => [2, 1, 0],
        }
    }

    /// BVHのチャンネル名（この順序で出力する）
    pub fn channel_names(self) -> [&'static str; 3] {
        const NAMES: [&str; 3] = ["Xrotation", "Yrotation", "Zrotation"];
        let idx = self.indices();
        [NAMES[idx[0]], NAMES[idx[1]], NAMES[idx[2]]]
    }

    /// (0,1,2)の偶置換なら+1、奇置換なら-1
    fn parity(self) -> f32 {
        match self {
            RotationOrder::Xyz | RotationOrder::Yzx | RotationOrder::Zxy => 1.0,
            RotationOrder::Xzy | RotationOrder::Yxz | RotationOrder::Zyx => -1.0,
        }
    }
}

/// 長さを検証して正規化する
/// ほぼゼロ長なら `DegenerateAxis`
pub fn normalize(v: Vector3<f32>) -> Result<Vector3<f32>, ConvertError> {
    let n = v.norm();
    if n < MIN_NORM {
        return Err(ConvertError::DegenerateAxis);
    }
    Ok(v / n)
}

/// 与えられた軸方向から右手系の正規直交基底を構築する
///
/// - ちょうど1軸が未指定: 残り2軸のクロス積で補完 (x=y×z, y=z×x, z=x×y)
/// - 2軸以上が未指定: デフォルト基底 X=(1,0,0), Y=(0,1,0) で補完
///   （同一位置キーポイント等の縮退ジオメトリ向けの最終手段）
/// - その後 `priority` の順に再直交化する。先頭の軸は方向をそのまま信頼し、
///   以降の軸は巡回クロス積 axis[i] = axis[i+1] × axis[i+2] で再構築する。
///
/// 返り値の行列は行ベクトルが X/Y/Z 軸。
pub fn axes_from_directions(
    x_dir: Option<Vector3<f32>>,
    y_dir: Option<Vector3<f32>>,
    z_dir: Option<Vector3<f32>>,
    priority: RotationOrder,
) -> Result<Matrix3<f32>, ConvertError> {
    // 1軸だけ欠けている場合はクロス積で導出
    let (x_dir, y_dir, z_dir) = match (x_dir, y_dir, z_dir) {
        (None, Some(y), Some(z)) => (Some(y.cross(&z)), Some(y), Some(z)),
        (Some(x), None, Some(z)) => (Some(x), Some(z.cross(&x)), Some(z)),
        (Some(x), Some(y), None) => (Some(x), Some(y), Some(x.cross(&y))),
        other => other,
    };

    // 2軸以上欠けている場合のデフォルト補完
    let x = x_dir.unwrap_or_else(Vector3::x);
    let y = y_dir.unwrap_or_else(Vector3::y);
    let z = match z_dir {
        Some(z) => z,
        None => x.cross(&y),
    };

    let mut axis = [x, y, z];
    let idx = priority.indices();
    axis[idx[0]] = normalize(axis[idx[0]])?;
    for &i in &idx[1..] {
        axis[i] = normalize(axis[(i + 1) % 3].cross(&axis[(i + 2) % 3]))?;
    }

    Ok(Matrix3::from_rows(&[
        axis[0].transpose(),
        axis[1].transpose(),
        axis[2].transpose(),
    ]))
}

/// 基底行列（行=各軸）をクォータニオンへ変換
/// 数値安定な分岐（最大対角要素基準）はnalgebra側の実装に委ねる
pub fn matrix_to_quaternion(m: &Matrix3<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(*m))
}

/// 親相対回転: parent⁻¹ · child
///
/// 親のワールド回転と合成すると子のワールド回転になる回転を返す。
/// この規約は全ジョイントで統一して使う（逆順の規約と混在させない）。
pub fn relative_quaternion(
    child: &UnitQuaternion<f32>,
    parent: &UnitQuaternion<f32>,
) -> UnitQuaternion<f32> {
    parent.inverse() * child
}

/// クォータニオンをオイラー角（度）へ変換
///
/// 回転行列を R = R_{o0}(θ0)・R_{o1}(θ1)・R_{o2}(θ2) と分解し、
/// チャンネル順 [θ0, θ1, θ2] で返す。
/// ジンバルロック時は θ2 = 0 とした有効解を1つ返す（パニックしない）。
pub fn quaternion_to_euler_deg(q: &UnitQuaternion<f32>, order: RotationOrder) -> [f32; 3] {
    let rot = q.to_rotation_matrix();
    let m = rot.matrix();
    let [i, j, k] = order.indices();
    let e = order.parity();

    let sin_beta = (e * m[(i, k)]).clamp(-1.0, 1.0);
    let beta = sin_beta.asin();

    let (alpha, gamma) = if sin_beta.abs() >= 1.0 - GIMBAL_EPS {
        // β=±90°: αとγは一意に分離できないため γ=0 の解を採る
        (f32::atan2(e * m[(k, j)], m[(j, j)]), 0.0)
    } else {
        (
            f32::atan2(-e * m[(j, k)], m[(k, k)]),
            f32::atan2(-e * m[(i, j)], m[(i, i)]),
        )
    };

    [alpha.to_degrees(), beta.to_degrees(), gamma.to_degrees()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn assert_near(a: f32, b: f32, msg: &str) {
        assert!((a - b).abs() < EPS, "{}: {} != {}", msg, a, b);
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(
            RotationOrder::Zyx.channel_names(),
            ["Zrotation", "Yrotation", "Xrotation"]
        );
        assert_eq!(
            RotationOrder::Zxy.channel_names(),
            ["Zrotation", "Xrotation", "Yrotation"]
        );
    }

    #[test]
    fn test_normalize_zero_vector_fails() {
        let result = normalize(Vector3::new(0.0, 0.0, 0.0));
        assert!(matches!(result, Err(ConvertError::DegenerateAxis)));
    }

    #[test]
    fn test_axes_identity() {
        let m = axes_from_directions(
            Some(Vector3::x()),
            Some(Vector3::y()),
            None,
            RotationOrder::Zyx,
        )
        .unwrap();
        let q = matrix_to_quaternion(&m);
        let euler = quaternion_to_euler_deg(&q, RotationOrder::Zyx);
        for v in euler {
            assert_near(v, 0.0, "identity euler");
        }
    }

    #[test]
    fn test_axes_orthonormal_right_handed() {
        // 斜めの2軸から補完: 結果は正規直交かつ右手系
        let m = axes_from_directions(
            Some(Vector3::new(1.0, 0.2, 0.0)),
            None,
            Some(Vector3::new(0.1, -0.3, 1.0)),
            RotationOrder::Zyx,
        )
        .unwrap();
        let x = m.row(0).transpose();
        let y = m.row(1).transpose();
        let z = m.row(2).transpose();
        assert_near(x.norm(), 1.0, "x norm");
        assert_near(y.norm(), 1.0, "y norm");
        assert_near(z.norm(), 1.0, "z norm");
        assert_near(x.dot(&y), 0.0, "x.y");
        assert_near(y.dot(&z), 0.0, "y.z");
        assert_near(x.dot(&z), 0.0, "x.z");
        // 右手系: x = y × z
        let cross = y.cross(&z);
        assert_near((cross - x).norm(), 0.0, "right-handedness");
    }

    #[test]
    fn test_axes_degenerate_input_fails() {
        // 平行な2軸はクロス積がゼロになり縮退
        let result = axes_from_directions(
            Some(Vector3::new(1.0, 0.0, 0.0)),
            None,
            Some(Vector3::new(2.0, 0.0, 0.0)),
            RotationOrder::Zyx,
        );
        assert!(matches!(result, Err(ConvertError::DegenerateAxis)));
    }

    #[test]
    fn test_axes_default_fallback() {
        // 2軸未指定でもデフォルト基底で成功する
        let m = axes_from_directions(
            None,
            None,
            Some(Vector3::new(0.0, 0.0, 2.0)),
            RotationOrder::Zyx,
        )
        .unwrap();
        let z = m.row(2).transpose();
        assert_near(z.x, 0.0, "z.x");
        assert_near(z.z, 1.0, "z.z");
    }

    #[test]
    fn test_euler_single_axis_rotation() {
        // Z軸まわり90°回転 → zyx順の先頭チャンネルが90
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 90f32.to_radians());
        let euler = quaternion_to_euler_deg(&q, RotationOrder::Zyx);
        assert_near(euler[0], 90.0, "z angle");
        assert_near(euler[1], 0.0, "y angle");
        assert_near(euler[2], 0.0, "x angle");
    }

    #[test]
    fn test_relative_quaternion() {
        let parent = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 30f32.to_radians());
        let child = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 50f32.to_radians());
        let rel = relative_quaternion(&child, &parent);
        let euler = quaternion_to_euler_deg(&rel, RotationOrder::Zyx);
        assert_near(euler[0], 20.0, "relative z angle");
        // parent * rel == child
        let recomposed = parent * rel;
        assert!((recomposed.angle_to(&child)).abs() < EPS);
    }

    #[test]
    fn test_euler_roundtrip_all_orders() {
        let orders = [
            RotationOrder::Xyz,
            RotationOrder::Xzy,
            RotationOrder::Yxz,
            RotationOrder::Yzx,
            RotationOrder::Zxy,
            RotationOrder::Zyx,
        ];
        let axes = [Vector3::x_axis(), Vector3::y_axis(), Vector3::z_axis()];
        for order in orders {
            let [i, j, k] = order.indices();
            let angles = [40f32, 25.0, -60.0];
            let q = UnitQuaternion::from_axis_angle(&axes[i], angles[0].to_radians())
                * UnitQuaternion::from_axis_angle(&axes[j], angles[1].to_radians())
                * UnitQuaternion::from_axis_angle(&axes[k], angles[2].to_radians());
            let euler = quaternion_to_euler_deg(&q, order);
            for (got, want) in euler.iter().zip(angles.iter()) {
                assert!(
                    (got - want).abs() < 1e-2,
                    "{:?}: got {:?}, want {:?}",
                    order,
                    euler,
                    angles
                );
            }
        }
    }

    #[test]
    fn test_euler_gimbal_lock_no_panic() {
        // Y軸90°でzyx順はジンバルロック
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 90f32.to_radians());
        let euler = quaternion_to_euler_deg(&q, RotationOrder::Zyx);
        for v in euler {
            assert!(v.is_finite());
        }
        assert_near(euler[1], 90.0, "gimbal y angle");
    }
}
