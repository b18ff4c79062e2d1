use anyhow::{Context, Result, bail};
use std::collections::HashSet;

const DEFAULT_SEED: u64 = 1337;
const MAX_RANGE_LEN: u64 = 10_000;

/// Resolve CLI seed tokens into a deduplicated, ordered seed list.
///
/// Accepts literal integers (negative values use their magnitude) and
/// inclusive ranges such as `10..20`. An empty list falls back to 1337.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        for seed in parse_token(token)? {
            if seen.insert(seed) {
                seeds.push(seed);
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

fn parse_token(token: &str) -> Result<Vec<u64>> {
    if let Some((start, end)) = token.split_once("..") {
        let start = parse_seed(start).with_context(|| format!("bad range start in {token}"))?;
        let end = parse_seed(end).with_context(|| format!("bad range end in {token}"))?;
        if end < start {
            bail!("Seed range {token} runs backwards");
        }
        if end - start >= MAX_RANGE_LEN {
            bail!("Seed range {token} is larger than {MAX_RANGE_LEN} seeds");
        }
        return Ok((start..=end).collect());
    }
    Ok(vec![parse_seed(token)?])
}

fn parse_seed(token: &str) -> Result<u64> {
    let token = token.trim();
    if let Ok(value) = token.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    if let Ok(value) = token.parse::<u64>() {
        return Ok(value);
    }
    bail!("Unrecognized seed token: {token}")
}
