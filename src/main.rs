//! compatkit - Adaptive Browser Compatibility Layer
//!
//! Planning CLI: classifies an identity string, resolves the remediations a
//! page with the given gaps would need, and prints the delivery plan as JSON.

use compatkit::environment::SimulatedEnvironment;
use compatkit::{CompatConfig, CompatibilityLayer, DeliveryBundle, Feature, NAME, VERSION};
use serde_json::{Value, json};
use std::env;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Args {
    user_agent: Option<String>,
    missing: Vec<Feature>,
    budget: Option<u64>,
    config: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(env::args().skip(1).collect()) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            print_usage();
            std::process::exit(2);
        }
    };

    match run(args) {
        Ok(plan) => println!("{}", plan),
        Err(e) => {
            eprintln!("❌ Failed to build plan: {}", e);
            std::process::exit(1);
        }
    }
}

fn parse_args(raw: Vec<String>) -> Result<Option<Args>, String> {
    let mut args = Args::default();
    let mut iter = raw.into_iter();

    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "-h" | "--help" => return Ok(None),
            "-V" | "--version" => {
                println!("{} v{}", NAME, VERSION);
                std::process::exit(0);
            }
            "--ua" => args.user_agent = Some(value(&mut iter, &flag)?),
            "--missing" => {
                for name in value(&mut iter, &flag)?.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    let feature =
                        Feature::from_str(name).ok_or_else(|| format!("unknown feature `{}`", name))?;
                    args.missing.push(feature);
                }
            }
            "--budget" => {
                let raw = value(&mut iter, &flag)?;
                let budget = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--budget expects a byte count, got `{}`", raw))?;
                args.budget = Some(budget);
            }
            "--config" => args.config = Some(value(&mut iter, &flag)?),
            other => return Err(format!("unexpected argument `{}`", other)),
        }
    }

    if args.user_agent.is_none() {
        return Err("--ua is required".to_string());
    }
    Ok(Some(args))
}

fn value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    iter.next().ok_or_else(|| format!("{} expects a value", flag))
}

fn print_usage() {
    eprintln!("{} v{}", NAME, VERSION);
    eprintln!("Usage: {} --ua <identity> [--missing a,b] [--budget N] [--config file]", NAME);
    eprintln!();
    eprintln!("Features:");
    for feature in Feature::all() {
        eprintln!("   • {}", feature);
    }
}

fn run(args: Args) -> compatkit::Result<String> {
    let mut config = match &args.config {
        Some(path) => CompatConfig::from_json_file(path)?,
        None => CompatConfig::default(),
    };
    if let Some(budget) = args.budget {
        config = config.with_max_bundle_size(budget);
    }

    // The page supports everything except what was reported missing
    let supported: Vec<Feature> = Feature::all()
        .iter()
        .copied()
        .filter(|f| !args.missing.contains(f))
        .collect();
    let env = SimulatedEnvironment::new(args.user_agent.as_deref().unwrap_or_default()).supporting(&supported);

    let layer = CompatibilityLayer::new(Arc::new(env), &config)?;
    let profile = layer.detect_environment();
    let required: Vec<Value> = layer
        .resolve_required(&profile)
        .iter()
        .map(|d| {
            json!({
                "name": d.name,
                "kind": d.kind.as_str(),
                "remoteUrl": d.remote_url,
                "estimatedSizeBytes": d.estimated_size_bytes,
                "priorityTier": d.priority_tier,
                "condition": d.condition.description(),
            })
        })
        .collect();

    let bundles: Vec<Value> = layer
        .get_js_bundles_for(&profile)
        .iter()
        .chain(layer.get_css_bundles_for(&profile).iter())
        .map(bundle_json)
        .collect();

    let plan = json!({
        "profile": &*profile,
        "required": required,
        "maxBundleSizeBytes": layer.max_bundle_size_bytes(),
        "bundles": bundles,
    });
    Ok(serde_json::to_string_pretty(&plan)?)
}

fn bundle_json(bundle: &DeliveryBundle) -> Value {
    json!({
        "id": bundle.id,
        "kind": bundle.kind.as_str(),
        "members": bundle.member_names,
        "totalSizeBytes": bundle.total_size_bytes,
        "priorityTier": bundle.priority_tier,
        "inline": bundle.is_inline(),
        "integrity": bundle.integrity.as_ref().map(|h| h.to_string()),
        "renderBlocking": bundle.hint.is_render_blocking(),
        "html": bundle.to_html(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let args = parse_args(strings(&["--ua", "Firefox/60.0", "--missing", "fetch, cssGrid", "--budget", "4096"]))
            .unwrap()
            .unwrap();
        assert_eq!(args.user_agent.as_deref(), Some("Firefox/60.0"));
        assert_eq!(args.missing, vec![Feature::Fetch, Feature::CssGrid]);
        assert_eq!(args.budget, Some(4096));
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(strings(&["--missing", "fetch"])).is_err());
        assert!(parse_args(strings(&["--ua", "x", "--missing", "teleport"])).is_err());
        assert!(parse_args(strings(&["--ua", "x", "--budget", "lots"])).is_err());
        assert!(parse_args(strings(&["--ua"])).is_err());
        assert!(parse_args(strings(&["--help"])).unwrap().is_none());
    }

    #[test]
    fn test_plan_lists_required_and_bundles() {
        let args = Args {
            user_agent: Some("Mozilla/5.0 (Windows NT 10.0) Chrome/70.0.3538.102 Safari/537.36".to_string()),
            missing: vec![Feature::Fetch, Feature::CssGrid],
            ..Default::default()
        };
        let plan: Value = serde_json::from_str(&run(args).unwrap()).unwrap();

        assert_eq!(plan["profile"]["browserFamily"], "chromium");
        assert_eq!(plan["required"].as_array().unwrap().len(), 2);
        let ids: Vec<&str> = plan["bundles"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|b| b["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["compat-script-critical", "compat-style-critical"]);
        assert_eq!(plan["bundles"][1]["inline"], true);
    }
}
