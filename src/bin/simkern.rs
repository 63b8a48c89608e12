// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

use clap::{Args, Parser, Subcommand};
use simkern::{Capability, DataType, DispatchOptions, Kernel, MetricKind};
use std::error::Error;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Inspect similarity kernel dispatch on this machine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the capabilities of the running processor.
    Detect,
    /// Print the tier a metric resolves to.
    Resolve(ResolveArgs),
    /// Compute a metric of two vectors given as comma separated lists.
    Compute(ComputeArgs),
}

#[derive(Args)]
struct Target {
    #[arg(short, long)]
    metric: MetricKind,
    #[arg(short, long)]
    datatype: DataType,
    /// Capabilities the resolver may pick from.
    #[arg(long, default_value = "all", env = DispatchOptions::ENV)]
    allowed: String,
}

impl Target {
    fn resolve(&self) -> Result<Kernel, Box<dyn Error>> {
        let options = DispatchOptions::from_list(&self.allowed)?;
        Ok(simkern::resolve_metric_with(
            &options,
            self.metric,
            self.datatype,
        )?)
    }
}

#[derive(Args)]
struct ResolveArgs {
    #[command(flatten)]
    target: Target,
}

#[derive(Args)]
struct ComputeArgs {
    #[command(flatten)]
    target: Target,
    #[arg(long, allow_hyphen_values = true)]
    lhs: String,
    #[arg(long, allow_hyphen_values = true)]
    rhs: String,
}

fn parse_list<T>(s: &str) -> Result<Vec<T>, Box<dyn Error>>
where
    T: FromStr,
    T::Err: Error + 'static,
{
    s.split(',')
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(|x| x.parse::<T>().map_err(|e| format!("bad element `{x}`: {e}").into()))
        .collect()
}

fn parse_bytes(s: &str) -> Result<Vec<u8>, Box<dyn Error>> {
    s.split(',')
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(|x| {
            let r = match x.strip_prefix("0x").or_else(|| x.strip_prefix("0b")) {
                Some(digits) if x.starts_with("0x") => u8::from_str_radix(digits, 16),
                Some(digits) => u8::from_str_radix(digits, 2),
                None => x.parse::<u8>(),
            };
            r.map_err(|e| format!("bad byte `{x}`: {e}").into())
        })
        .collect()
}

fn compute(kernel: &Kernel, lhs: &str, rhs: &str) -> Result<f32, Box<dyn Error>> {
    fn check<T>(lhs: &[T], rhs: &[T]) -> Result<(), Box<dyn Error>> {
        if lhs.len() != rhs.len() {
            return Err(format!(
                "vectors differ in length: {} and {}",
                lhs.len(),
                rhs.len()
            )
            .into());
        }
        Ok(())
    }
    let result = match kernel.datatype() {
        DataType::Float64 => {
            let (lhs, rhs) = (parse_list::<f64>(lhs)?, parse_list::<f64>(rhs)?);
            check(&lhs, &rhs)?;
            kernel.compute(&lhs, &rhs)
        }
        DataType::Float32 => {
            let (lhs, rhs) = (parse_list::<f32>(lhs)?, parse_list::<f32>(rhs)?);
            check(&lhs, &rhs)?;
            kernel.compute(&lhs, &rhs)
        }
        DataType::Float16 => {
            let (lhs, rhs) = (parse_list::<f32>(lhs)?, parse_list::<f32>(rhs)?);
            check(&lhs, &rhs)?;
            let lhs = lhs.into_iter().map(simkern::f16::from_f32).collect::<Vec<_>>();
            let rhs = rhs.into_iter().map(simkern::f16::from_f32).collect::<Vec<_>>();
            kernel.compute(&lhs, &rhs)
        }
        DataType::Int8 => {
            let (lhs, rhs) = (parse_list::<i8>(lhs)?, parse_list::<i8>(rhs)?);
            check(&lhs, &rhs)?;
            kernel.compute(&lhs, &rhs)
        }
        DataType::Bit1 => {
            let (lhs, rhs) = (parse_bytes(lhs)?, parse_bytes(rhs)?);
            check(&lhs, &rhs)?;
            kernel.hamming(&lhs, &rhs) as f32
        }
    };
    Ok(result)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Detect => {
            let detected = simkern::detect_capabilities();
            println!("detected: {detected}");
            for name in Capability::all().lowercase_names() {
                if let Some(capability) = Capability::from_lowercase_name(name) {
                    let mark = if detected.contains(capability) { "yes" } else { "no" };
                    println!("{name:>12}: {mark}");
                }
            }
            #[cfg(target_arch = "x86_64")]
            println!("cpuid: {:?}", simkern::cpuid_features());
        }
        Commands::Resolve(ResolveArgs { target }) => {
            let kernel = target.resolve()?;
            println!("{} {} {}", kernel.kind(), kernel.datatype(), kernel.capability());
        }
        Commands::Compute(ComputeArgs { target, lhs, rhs }) => {
            let kernel = target.resolve()?;
            let result = compute(&kernel, &lhs, &rhs)?;
            tracing::info!("computed with tier {}", kernel.capability());
            println!("{result}");
        }
    }
    Ok(())
}
