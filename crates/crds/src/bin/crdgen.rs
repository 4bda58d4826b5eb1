//! Prints the Falcon Operator CRDs as YAML.
//!
//! Usage: `cargo run -p crds --bin crdgen > config/crd/falconconfigs.yaml`

use crds::FalconConfig;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&FalconConfig::crd())?);
    Ok(())
}
