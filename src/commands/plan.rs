// ABOUTME: Plan command implementation.
// ABOUTME: Prints the build's target and the ordered step list without running anything.

use std::fmt;

use labforge::config::Config;
use labforge::error::Result;
use labforge::output::Output;
use labforge::pipeline::step_plan;
use labforge::remote::OsType;
use serde::Serialize;

#[derive(Serialize)]
struct Plan {
    lab: String,
    os_type: OsType,
    image: String,
    gallery: Option<String>,
    steps: Vec<&'static str>,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lab: {}", self.lab)?;
        writeln!(f, "OS: {}", self.os_type)?;
        writeln!(f, "Image: {}", self.image)?;
        if let Some(gallery) = &self.gallery {
            writeln!(f, "Gallery version: {gallery}")?;
        }
        write!(f, "Steps:")?;
        for (i, step) in self.steps.iter().enumerate() {
            write!(f, "\n  {}. {step}", i + 1)?;
        }
        Ok(())
    }
}

pub fn plan(config: &Config, output: &Output) -> Result<()> {
    config.validate()?;

    let plan = Plan {
        lab: config.lab_id().to_string(),
        os_type: config.os_type,
        image: config
            .lab_id()
            .custom_image(config.capture.image_name.as_str())
            .to_string(),
        gallery: config
            .gallery
            .as_ref()
            .map(|g| g.version_id(&config.subscription_id).to_string()),
        steps: step_plan(config),
    };
    output.result(&plan);
    Ok(())
}
