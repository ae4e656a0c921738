use crate::cli::{SchemaArgs, SchemaTarget};
use crate::config::Config;
use crate::pipeline::ComprehensiveSummary;
use schemars::schema_for;

pub fn execute(args: SchemaArgs) -> anyhow::Result<()> {
    let schema = match args.target {
        SchemaTarget::Config => schema_for!(Config),
        SchemaTarget::Summary => schema_for!(ComprehensiveSummary),
    };
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{}", json);
    Ok(())
}
