use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use gitblog::config::{parse_config, CFG_FILE_NAME};

use crate::decompress::decompress_files;
use crate::BootstrapArgs;

const SAMPLE_CFG: &str = include_str!("../../../gitblog.toml");

fn write_sample_cfg(out_dir: &Path) -> Result<()> {
    let cfg_path = out_dir.join(CFG_FILE_NAME);
    if cfg_path.exists() {
        bail!("{} already exists, not overwriting it", cfg_path.display());
    }

    let file = File::create(&cfg_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(replace_paths(out_dir, SAMPLE_CFG).as_bytes())?;
    writer.flush()?;

    Ok(())
}

/// Points the `res/...` paths of the sample configuration to the bootstrapped directory.
fn replace_paths(prefix: &Path, config_data: &str) -> String {
    lazy_static! {
        static ref RES_REGEX: Regex = Regex::new(r#""res/(?P<rest>[\w/]+)""#).unwrap();
    }

    let prefix = prefix.to_string_lossy();
    let prefix = prefix.trim_end_matches('/');
    RES_REGEX.replace_all(config_data, |cap: &Captures| {
        format!("\"{}/{}\"", prefix, &cap["rest"])
    }).to_string()
}

pub fn bootstrap_cmd(args: BootstrapArgs) -> Result<()> {
    let out_path = fs::canonicalize(&args.out_dir)
        .with_context(|| format!("Error converting path to absolute: {}", args.out_dir))?;

    if !out_path.is_dir() {
        bail!("Output path must be a directory: {}", out_path.display());
    }

    decompress_files(&out_path).context("Error bootstrapping")?;
    write_sample_cfg(&out_path).context("Error writing gitblog configuration")?;

    // The sample has to stay loadable by the server
    let cfg_path = out_path.join(CFG_FILE_NAME);
    parse_config(&fs::read_to_string(&cfg_path)?)?;
    println!("Blog created in {}. Configuration: {}", out_path.display(), cfg_path.display());

    Ok(())
}
