//! Two-image comparison command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use signature_match::{ssim, write_ssim_map};

use crate::ScoreOptions;

pub fn run(
    first: PathBuf,
    second: PathBuf,
    options: &ScoreOptions,
    json: bool,
    ssim_map: Option<PathBuf>,
) -> Result<()> {
    let scorer = options.scorer()?;
    let threshold = options.threshold()?;

    log::info!("Comparing {} with {}", first.display(), second.display());

    let a = scorer
        .prepare(&first)
        .with_context(|| format!("Failed to load {}", first.display()))?;
    let b = scorer
        .prepare(&second)
        .with_context(|| format!("Failed to load {}", second.display()))?;

    let report = scorer.compare_prepared(&a, &b)?.with_verdict(threshold);
    let verdict = threshold.classify(report.score);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", verdict.title());
        println!("{}", verdict.message(report.score));

        if let Some(dssim) = report.metrics.dssim {
            println!("DSSIM: {:.6}", dssim);
        }
        if options.psnr {
            // None means the normalized images are identical
            match report.metrics.psnr {
                Some(psnr) => println!("PSNR: {:.2} dB", psnr),
                None => println!("PSNR: inf"),
            }
        }
    }

    if let Some(map_path) = ssim_map {
        let map = ssim::ssim_map(a.pixels(), b.pixels(), &scorer.config().ssim)?;
        write_ssim_map(map.as_ref(), &map_path)
            .with_context(|| format!("Failed to write SSIM map to {}", map_path.display()))?;
        log::info!("SSIM map saved to {}", map_path.display());
    }

    Ok(())
}
