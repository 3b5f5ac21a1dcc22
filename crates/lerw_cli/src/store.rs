//! Storage inspection and maintenance commands.

use lerw_cache::CacheKeyBuilder;

use crate::context::{load_config, orchestrator};
use crate::params::ParamArgs;
use crate::GlobalArgs;

/// `lerw-cache key`: prints the cache key.
pub fn key(args: &ParamArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config(global)?;
    let params = args.resolve(&config.defaults)?;
    println!("{}", CacheKeyBuilder::build(&params));
    Ok(0)
}

/// `lerw-cache path`: prints the artifact path and whether it is published.
pub fn path(args: &ParamArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config(global)?;
    let params = args.resolve(&config.defaults)?;
    let orch = orchestrator(&config);
    let key = CacheKeyBuilder::build(&params);
    let state = if orch.store().exists(&key) {
        "cached"
    } else {
        "missing"
    };
    println!("{}\t{state}", orch.store().path(&key).display());
    Ok(0)
}

/// `lerw-cache invalidate`: deletes the artifact if present.
pub fn invalidate(
    args: &ParamArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config(global)?;
    let params = args.resolve(&config.defaults)?;
    let orch = orchestrator(&config);
    let key = CacheKeyBuilder::build(&params);
    let removed = orch.store().invalidate(&key)?;
    if !global.quiet {
        if removed {
            eprintln!("    Removed {key}");
        } else {
            eprintln!("    Not cached {key}");
        }
    }
    Ok(0)
}

/// `lerw-cache list`: prints every published key, sorted.
pub fn list(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config(global)?;
    let orch = orchestrator(&config);
    let keys = orch.store().list()?;
    for key in &keys {
        println!("{key}");
    }
    if !global.quiet {
        eprintln!(
            "   {} artifact(s) in {}",
            keys.len(),
            orch.store().root().display()
        );
    }
    Ok(0)
}

/// `lerw-cache sweep`: removes staging files left by interrupted runs.
pub fn sweep(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config(global)?;
    let orch = orchestrator(&config);
    let removed = orch.store().sweep_staging()?;
    if !global.quiet {
        eprintln!("    Swept {removed} staging file(s)");
    }
    Ok(0)
}
