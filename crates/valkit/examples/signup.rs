//! Validate a signup payload given as JSON on the command line.
//!
//! Run with:
//!   cargo run --example signup --features logging -- \
//!     '{"email":"ada@example.com","password":"hunter22","plan":"pro","tags":["a"]}'
//!
//! Set `VALKIT_LOG=trace` to watch union and discriminator decisions.

use valkit::logging::{init_logging, LogFormat, LogLevel};
use valkit::prelude::*;
use valkit::schema::{email, iso_datetime};

fn signup() -> Schema<Map> {
    object(
        Shape::new()
            .field("email", email())
            .field("password", string().min(8).max(64))
            .field("plan", enumeration(["free", "pro", "team"]).default("free".to_owned()))
            .field("seats", int().positive().max(500).optional())
            .field("tags", array(string().trim().min(1)).max(10))
            .field("signed_up_at", iso_datetime().optional()),
    )
    .strict()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let level = std::env::var("VALKIT_LOG")
        .ok()
        .map(|s| s.parse::<LogLevel>())
        .transpose()?
        .unwrap_or(LogLevel::Warn);
    init_logging(LogFormat::Text, level);

    let raw = std::env::args()
        .nth(1)
        .unwrap_or_else(|| r#"{"email":"ada@example.com","password":"short","tags":[" "]}"#.into());
    let input = Value::from_json_str(&raw)?;

    match signup().parse(input) {
        Ok(out) => println!("{}", Value::Object(out).to_json()?),
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{}", serde_json::to_string_pretty(&err.flatten())?);
            std::process::exit(1);
        }
    }
    Ok(())
}
