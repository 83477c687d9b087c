use serframe_frame::{DEFAULT_CAPACITY, DEFAULT_IDLE_PERIOD, DEFAULT_QUEUE_DEPTH};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("serframe {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: serframe");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("SERFRAME_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("SERFRAME_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("features: async={}, cli=true", cfg!(feature = "async"));
    println!(
        "defaults: capacity={}, idle_ms={}, queue_depth={}",
        DEFAULT_CAPACITY,
        DEFAULT_IDLE_PERIOD.as_millis(),
        DEFAULT_QUEUE_DEPTH
    );

    Ok(SUCCESS)
}
