//! 3Dポーズ列からBVHモーションキャプチャドキュメントを生成する変換コア
//!
//! 上流の3D姿勢推定が出力したキーポイント列とルート移動トラックを受け取り、
//! スケルトン定義（CMU / OpenPose）に従ってボーンオフセットと
//! フレームごとの回転チャンネルを計算し、BVHテキストとして書き出す。

pub mod bvh;
pub mod config;
pub mod convert;
pub mod error;
pub mod math;
pub mod pose;
pub mod skeleton;
