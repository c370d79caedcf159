//! Single-page HTML listing

use std::io::Write;

use super::{html, RenderOptions, Renderer};
use crate::core::{Report, RunContext};
use crate::utils::RenderError;

/// Banner, summary, failures, then every probe one after another
#[derive(Debug, Clone, Default)]
pub struct FlatRenderer {
    options: RenderOptions,
}

impl FlatRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }
}

impl Renderer for FlatRenderer {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn content_type(&self) -> &'static str {
        html::CONTENT_TYPE
    }

    fn render(
        &self,
        report: &Report,
        ctx: &RunContext,
        out: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let mut page = String::new();
        html::page_start(&mut page, report, &[]);
        html::banner(&mut page, report);
        html::summary(&mut page, &report.summary());
        html::failures(&mut page, report);
        for result in &report.results {
            html::probe_result(&mut page, result);
        }
        html::decorations(&mut page, &self.options, ctx);
        html::page_end(&mut page);

        out.write_all(page.as_bytes())?;
        Ok(())
    }
}
