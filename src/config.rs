use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// 変換設定
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub skeleton: SkeletonConfig,
    #[serde(default)]
    pub root_motion: RootMotionConfig,
    #[serde(default)]
    pub offsets: OffsetConfig,
}

/// 出力リグの選択
#[derive(Debug, Deserialize, Clone)]
pub struct SkeletonConfig {
    /// リグの種類 ("cmu" | "openpose")
    #[serde(default = "default_variant")]
    pub variant: String,
}

/// ルート並進チャンネルのリスケール範囲
///
/// ルート移動トラックは[0,1]正規化座標で供給される。
/// 出力ドキュメントの空間単位へ線形リスケールすることで、
/// 3Dリフティングモデルの任意単位から出力スケールを切り離す。
#[derive(Debug, Deserialize, Clone)]
pub struct RootMotionConfig {
    /// X座標の出力下限
    #[serde(default = "default_x_min")]
    pub x_min: f32,
    /// X座標の出力上限
    #[serde(default = "default_x_max")]
    pub x_max: f32,
    /// Y座標の出力下限
    #[serde(default = "default_y_min")]
    pub y_min: f32,
    /// Y座標の出力上限
    #[serde(default = "default_y_max")]
    pub y_max: f32,
}

/// ボーン長推定のフォールバック定数
#[derive(Debug, Deserialize, Clone)]
pub struct OffsetConfig {
    /// キーポイント対応を持たない仮想ジョイント・エンドサイトのボーン長
    /// （背骨の細分などリグ構造上だけ必要なジョイント向け）
    #[serde(default = "default_virtual_bone_length")]
    pub virtual_bone_length: f32,
    /// 長さ推定エッジもフォールバック定数もない場合の最終デフォルト
    /// （ゼロにするとジョイントが同一位置に縮退するため小さい正値）
    #[serde(default = "default_bone_length")]
    pub default_bone_length: f32,
}

fn default_variant() -> String {
    "cmu".to_string()
}
fn default_x_min() -> f32 {
    -50.0
}
fn default_x_max() -> f32 {
    50.0
}
fn default_y_min() -> f32 {
    0.0
}
fn default_y_max() -> f32 {
    50.0
}
fn default_virtual_bone_length() -> f32 {
    0.1
}
fn default_bone_length() -> f32 {
    0.1
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            variant: default_variant(),
        }
    }
}

impl Default for RootMotionConfig {
    fn default() -> Self {
        Self {
            x_min: default_x_min(),
            x_max: default_x_max(),
            y_min: default_y_min(),
            y_max: default_y_max(),
        }
    }
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            virtual_bone_length: default_virtual_bone_length(),
            default_bone_length: default_bone_length(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// 設定ファイルがなければデフォルト値で動く
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rescale_bounds() {
        let config = Config::default();
        assert_eq!(config.root_motion.x_min, -50.0);
        assert_eq!(config.root_motion.x_max, 50.0);
        assert_eq!(config.root_motion.y_min, 0.0);
        assert_eq!(config.root_motion.y_max, 50.0);
    }

    #[test]
    fn test_default_bone_lengths() {
        let config = Config::default();
        assert_eq!(config.offsets.virtual_bone_length, 0.1);
        assert_eq!(config.offsets.default_bone_length, 0.1);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [skeleton]
            variant = "openpose"

            [root_motion]
            x_max = 100.0
            "#,
        )
        .unwrap();
        assert_eq!(config.skeleton.variant, "openpose");
        assert_eq!(config.root_motion.x_max, 100.0);
        // 未指定フィールドはデフォルト
        assert_eq!(config.root_motion.x_min, -50.0);
        assert_eq!(config.offsets.virtual_bone_length, 0.1);
    }
}
