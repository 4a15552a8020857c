use anyhow::{bail, Context, Result};
use ndarray::{Array2, Array3};
use ndarray_npy::read_npy;
use std::env;

use pose2bvh::config::Config;
use pose2bvh::convert::poses_to_bvh;
use pose2bvh::pose::{PoseSequence, RootMotionTrack};
use pose2bvh::skeleton;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 || args.len() > 5 {
        bail!(
            "usage: {} <poses.npy> <root_track.npy> <output.bvh> [fps]",
            args[0]
        );
    }
    let poses_path = &args[1];
    let track_path = &args[2];
    let output_path = &args[3];
    let fps: f32 = match args.get(4) {
        Some(s) => s.parse().with_context(|| format!("invalid fps: {s}"))?,
        None => 30.0,
    };

    let config = Config::load_or_default("config.toml");
    let skeleton = match config.skeleton.variant.as_str() {
        "cmu" => skeleton::cmu()?,
        "openpose" => skeleton::openpose()?,
        other => bail!("unknown skeleton variant: {other}"),
    };

    let poses_raw: Array3<f32> =
        read_npy(poses_path).with_context(|| format!("failed to read {poses_path}"))?;
    let track_raw: Array2<f32> =
        read_npy(track_path).with_context(|| format!("failed to read {track_path}"))?;
    let poses = PoseSequence::new(poses_raw)?;
    let track = RootMotionTrack::new(track_raw)?;

    println!(
        "{}リグで{}フレームを変換します",
        skeleton.variant(),
        poses.frame_count()
    );

    let document = poses_to_bvh(&skeleton, &poses, &track, fps, &config)?;
    if document.fallback_count > 0 {
        println!(
            "縮退した基底が{}件ありました（親の姿勢で補完済み）",
            document.fallback_count
        );
    }
    document.save(output_path)?;

    println!("{output_path} に書き出しました");
    Ok(())
}
