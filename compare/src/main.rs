use std::{env, io};

use anyhow::{Context, Result, bail};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: sascomp <config.json>");
    };

    let mut out = io::stdout().lock();
    compare::compare_file(&path, &mut out).with_context(|| format!("comparison from {path} failed"))?;
    Ok(())
}
