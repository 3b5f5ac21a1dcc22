//! `lerw-cache get`: get-or-compute with text or JSON output.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use lerw_cache::{CacheKey, Fetched, Origin, ParsedResult};
use lerw_common::ContentHash;
use serde::Serialize;

use crate::context::{load_config, orchestrator};
use crate::{GetArgs, GlobalArgs, OutputFormat};

/// JSON view of a fetched result.
#[derive(Serialize)]
struct Report<'a> {
    key: &'a CacheKey,
    path: &'a Path,
    origin: Origin,
    checksum: ContentHash,
    rows: usize,
    result: &'a ParsedResult,
}

impl<'a> From<&'a Fetched> for Report<'a> {
    fn from(fetched: &'a Fetched) -> Self {
        Self {
            key: &fetched.key,
            path: &fetched.path,
            origin: fetched.origin,
            checksum: fetched.checksum,
            rows: fetched.result.len(),
            result: &fetched.result,
        }
    }
}

/// Runs the `get` command.
pub fn run(args: &GetArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_config(global)?;
    let params = args.params.resolve(&config.defaults)?;
    let orch = orchestrator(&config);

    let fetched = orch.fetch(&params, args.recompute)?;

    if !global.quiet {
        let verb = match fetched.origin {
            Origin::Cached => "Cached",
            Origin::Computed => "Computed",
        };
        eprintln!(
            "   {verb} {} ({} rows, {})",
            fetched.key,
            fetched.result.len(),
            fetched.checksum.short()
        );
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match args.format {
        OutputFormat::Text => write_rows(&mut out, &fetched.result)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &Report::from(&fetched))?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(0)
}

/// Writes one value per line for lengths, `x, y, ...` per line for points.
fn write_rows(out: &mut impl Write, result: &ParsedResult) -> io::Result<()> {
    match result {
        ParsedResult::Lengths(lengths) => {
            for length in lengths {
                writeln!(out, "{length}")?;
            }
        }
        ParsedResult::Points(points) => {
            for point in points {
                let row: Vec<String> = point.iter().map(i64::to_string).collect();
                writeln!(out, "{}", row.join(", "))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn render(result: &ParsedResult) -> String {
        let mut buf = Vec::new();
        write_rows(&mut buf, result).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn lengths_one_per_line() {
        let text = render(&ParsedResult::Lengths(vec![51, 41, 42]));
        assert_eq!(text, "51\n41\n42\n");
    }

    #[test]
    fn points_comma_separated() {
        let text = render(&ParsedResult::Points(vec![vec![0, 0], vec![1, -1]]));
        assert_eq!(text, "0, 0\n1, -1\n");
    }

    #[test]
    fn json_report_carries_provenance() {
        let body = b"51\n";
        let fetched = Fetched {
            key: CacheKey::from_stem("lengths_dim2_dist10_n1_a0.5_L2_rng3").unwrap(),
            path: PathBuf::from("data/lengths_dim2_dist10_n1_a0.5_L2_rng3.txt"),
            origin: Origin::Computed,
            checksum: ContentHash::from_bytes(body),
            result: ParsedResult::Lengths(vec![51]),
        };
        let json = serde_json::to_value(Report::from(&fetched)).unwrap();
        assert_eq!(json["key"], "lengths_dim2_dist10_n1_a0.5_L2_rng3");
        assert_eq!(json["origin"], "computed");
        assert_eq!(json["rows"], 1);
        assert_eq!(json["checksum"], ContentHash::from_bytes(body).to_string());
        assert_eq!(json["result"]["lengths"][0], 51);
    }
}
