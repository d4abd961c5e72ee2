use clap::Args;
use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::fingerprint::{self, DeviceInfo};

#[derive(Debug, Args)]
pub struct FingerprintArgs {
    #[arg(long)]
    pub user_agent: Option<String>,
    #[arg(long)]
    pub platform: Option<String>,
    #[arg(long)]
    pub language: Option<String>,
    #[arg(long)]
    pub timezone: Option<String>,
    #[arg(long, help = "Screen size, e.g. 1920x1080")]
    pub screen: Option<String>,
    #[arg(long)]
    pub color_depth: Option<u32>,
    #[arg(long)]
    pub hardware_concurrency: Option<u32>,
    #[arg(long)]
    pub touch_points: Option<u32>,
}

impl From<FingerprintArgs> for DeviceInfo {
    fn from(args: FingerprintArgs) -> Self {
        DeviceInfo {
            user_agent: args.user_agent,
            platform: args.platform,
            language: args.language,
            timezone: args.timezone,
            screen: args.screen,
            color_depth: args.color_depth,
            hardware_concurrency: args.hardware_concurrency,
            touch_points: args.touch_points,
        }
    }
}

pub fn handle(args: FingerprintArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let device = DeviceInfo::from(args);
    if device.is_empty() {
        anyhow::bail!("at least one device attribute is required");
    }
    let hash = fingerprint::fingerprint(&device);

    match output_format {
        OutputFormat::Text => {
            println!("{}", hash);
            Ok(())
        }
        OutputFormat::Json => output_success(output_format, "Device fingerprint", Some(json!({ "fingerprint": hash }))),
    }
}
