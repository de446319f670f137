//! @acp:module "Parse Command"
//! @acp:summary "Print the parsed intent of a request"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::Result;

use crate::classify::{classify, required_domains};
use crate::intent::parse;

/// Options for the parse command
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub text: String,
}

/// Execute the parse command
pub fn execute_parse(options: ParseOptions) -> Result<()> {
    let intent = parse(&options.text);
    let output = serde_json::json!({
        "intent": intent,
        "type": classify(&intent),
        "domains": required_domains(&intent),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
