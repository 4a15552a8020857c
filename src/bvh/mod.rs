//! BVHドキュメントの構築と書き出し
//!
//! HIERARCHYブロックはスケルトンの行きがけ順で再帰的に出力し、
//! MOTIONブロックのチャンネル順は同じトラバース順に一致させる。
//! 浮動小数点は固定小数6桁（指数表記なし）で書く。

use std::fmt::Write as FmtWrite;
use std::fs;
use std::io::Write;
use std::path::Path;

use nalgebra::Vector3;
use tracing::info;

use crate::error::ConvertError;
use crate::skeleton::Skeleton;

const INDENT: &str = "    ";

/// 変換済みのBVHドキュメント
///
/// 階層（スケルトン＋オフセット）とモーション（フレーム列）を持つ。
/// 書き出しは純粋な整形で、ここで計算は行わない。
#[derive(Debug, Clone)]
pub struct BvhDocument {
    pub skeleton: Skeleton,
    pub offsets: Vec<Vector3<f32>>,
    pub frames: Vec<Vec<f32>>,
    pub fps: f32,
    /// 変換中に縮退基底フォールバックが起きた回数
    pub fallback_count: u64,
}

impl BvhDocument {
    /// BVHテキストへ整形する
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("HIERARCHY\n");
        self.render_joint(&mut out, self.skeleton.root(), 0);
        out.push_str("MOTION\n");
        let _ = writeln!(out, "Frames: {}", self.frames.len());
        let _ = writeln!(out, "Frame Time: {:.6}", 1.0 / self.fps);
        for frame in &self.frames {
            let line = frame
                .iter()
                .map(|v| format!("{v:.6}"))
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    fn render_joint(&self, out: &mut String, index: usize, depth: usize) {
        let joint = self.skeleton.joint(index);
        let pad = INDENT.repeat(depth);
        let offset = self.offsets[index];

        if joint.end_site {
            let _ = writeln!(out, "{pad}End Site");
            let _ = writeln!(out, "{pad}{{");
            let _ = writeln!(
                out,
                "{pad}{INDENT}OFFSET {:.6} {:.6} {:.6}",
                offset.x, offset.y, offset.z
            );
            let _ = writeln!(out, "{pad}}}");
            return;
        }

        let is_root = joint.parent.is_none();
        let keyword = if is_root { "ROOT" } else { "JOINT" };
        let _ = writeln!(out, "{pad}{keyword} {}", joint.name);
        let _ = writeln!(out, "{pad}{{");
        let _ = writeln!(
            out,
            "{pad}{INDENT}OFFSET {:.6} {:.6} {:.6}",
            offset.x, offset.y, offset.z
        );
        if let Some(order) = joint.order {
            let names = order.channel_names();
            if is_root {
                let _ = writeln!(
                    out,
                    "{pad}{INDENT}CHANNELS 6 Xposition Yposition Zposition {} {} {}",
                    names[0], names[1], names[2]
                );
            } else {
                let _ = writeln!(
                    out,
                    "{pad}{INDENT}CHANNELS 3 {} {} {}",
                    names[0], names[1], names[2]
                );
            }
        }

        if joint.children.is_empty() {
            // 子のないジョイントにも暗黙のエンドサイトを与え、
            // パーサが葉の終端を判定できるようにする
            let _ = writeln!(out, "{pad}{INDENT}End Site");
            let _ = writeln!(out, "{pad}{INDENT}{{");
            let _ = writeln!(out, "{pad}{INDENT}{INDENT}OFFSET 0.000000 0.000000 0.000000");
            let _ = writeln!(out, "{pad}{INDENT}}}");
        } else {
            for &child in &joint.children {
                self.render_joint(out, child, depth + 1);
            }
        }
        let _ = writeln!(out, "{pad}}}");
    }

    /// 任意のライタへ書き出す
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), ConvertError> {
        writer.write_all(self.render().as_bytes())?;
        Ok(())
    }

    /// ファイルへ原子的に保存する
    ///
    /// 一時ファイルへ書いてからリネームする。書き出し途中で失敗しても
    /// 出力先に中途半端なドキュメントが残らない。
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConvertError> {
        let path = path.as_ref();
        let mut tmp = path.as_os_str().to_os_string();
        tmp.push(".tmp");

        let result = (|| -> Result<(), ConvertError> {
            let mut file = fs::File::create(&tmp)?;
            self.write_to(&mut file)?;
            file.sync_all()?;
            fs::rename(&tmp, path)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        } else {
            info!(path = %path.display(), frames = self.frames.len(), "saved document");
        }
        result
    }
}
