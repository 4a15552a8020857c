use nalgebra::Vector3;
use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::error::ConvertError;

/// 3Dポーズ列 `[フレーム][ジョイント][xyz]`
///
/// 上流の3D推定器が一度だけ生成し、この変換コアが一度だけ消費する。
/// 生成時に全要素の有限性を検証するので、以降の計算はNaN/Infを
/// 気にせず進められる。
#[derive(Debug, Clone)]
pub struct PoseSequence {
    data: Array3<f32>,
}

impl PoseSequence {
    /// 検証付きで生成する
    /// 空列・不正形状・非有限座標は即エラー
    pub fn new(data: Array3<f32>) -> Result<Self, ConvertError> {
        let shape = data.shape();
        if shape[0] == 0 {
            return Err(ConvertError::EmptySequence);
        }
        if shape[2] != 3 {
            return Err(ConvertError::InvalidShape(format!(
                "expected [frames][joints][3], got [{}][{}][{}]",
                shape[0], shape[1], shape[2]
            )));
        }
        for ((frame, joint, _), &v) in data.indexed_iter() {
            if !v.is_finite() {
                return Err(ConvertError::NonFiniteCoordinate { frame, joint });
            }
        }
        Ok(Self { data })
    }

    pub fn frame_count(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn joint_count(&self) -> usize {
        self.data.shape()[1]
    }

    pub fn frame(&self, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), index)
    }

    /// 指定フレームのキーポイント位置
    pub fn point(&self, frame: usize, joint: usize) -> Vector3<f32> {
        Vector3::new(
            self.data[(frame, joint, 0)],
            self.data[(frame, joint, 1)],
            self.data[(frame, joint, 2)],
        )
    }
}

/// ルート移動トラック `[フレーム][xyz]`
///
/// 骨盤の平滑化済み並進を正規化座標[0,1]で保持する。
/// ポーズ列とは独立のライフタイムを持つが、フレーム数は
/// 一致していなければならない（変換入口で検証する）。
#[derive(Debug, Clone)]
pub struct RootMotionTrack {
    data: Array2<f32>,
}

impl RootMotionTrack {
    pub fn new(data: Array2<f32>) -> Result<Self, ConvertError> {
        let shape = data.shape();
        if shape[1] != 3 {
            return Err(ConvertError::InvalidShape(format!(
                "expected [frames][3], got [{}][{}]",
                shape[0], shape[1]
            )));
        }
        for ((frame, _), &v) in data.indexed_iter() {
            if !v.is_finite() {
                return Err(ConvertError::NonFiniteCoordinate { frame, joint: 0 });
            }
        }
        Ok(Self { data })
    }

    pub fn frame_count(&self) -> usize {
        self.data.shape()[0]
    }

    pub fn point(&self, frame: usize) -> Vector3<f32> {
        Vector3::new(
            self.data[(frame, 0)],
            self.data[(frame, 1)],
            self.data[(frame, 2)],
        )
    }
}
