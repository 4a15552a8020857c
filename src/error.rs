use thiserror::Error;

/// 変換処理のエラー分類
///
/// 入力検証エラー（空列・フレーム数不一致・非有限座標）は変換全体を
/// 即座に失敗させる。フレーム単位の縮退（共線・同一位置のランドマーク）は
/// ここには現れず、コンバータ内でフォールバック処理される。
#[derive(Debug, Error)]
pub enum ConvertError {
    /// ポーズ列が空
    #[error("pose sequence is empty")]
    EmptySequence,

    /// ポーズ列とルート移動トラックのフレーム数が一致しない
    #[error("frame count mismatch: poses={poses}, root_track={root_track}")]
    FrameCountMismatch { poses: usize, root_track: usize },

    /// NaN / Inf を含む座標
    #[error("non-finite coordinate at frame {frame}, joint {joint}")]
    NonFiniteCoordinate { frame: usize, joint: usize },

    /// 入力テンソルの形状が不正
    #[error("invalid tensor shape: {0}")]
    InvalidShape(String),

    /// ほぼゼロ長のベクトルを正規化しようとした
    #[error("degenerate axis: vector norm below threshold")]
    DegenerateAxis,

    /// スケルトンが参照するキーポイントがポーズデータの範囲外
    /// （スケルトン定義と入力データの不整合）
    #[error("keypoint index {keypoint} out of range (source has {available} joints)")]
    KeypointOutOfRange { keypoint: usize, available: usize },

    /// スケルトン定義テーブル自体の不整合
    #[error("skeleton definition error: {0}")]
    SkeletonDefinition(String),

    /// fpsは正の値でなければならない
    #[error("fps must be positive, got {0}")]
    InvalidFps(f32),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
