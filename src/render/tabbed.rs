//! Tabbed HTML report: a summary tab plus one tab per probe
//!
//! Tab switching is done by the bundled `tabs.js`; without it every panel
//! is simply shown in sequence.

use std::fmt::Write as _;
use std::io::Write;

use super::{html, RenderOptions, Renderer};
use crate::core::{Report, RunContext};
use crate::format::escape_html;
use crate::utils::RenderError;

#[derive(Debug, Clone, Default)]
pub struct TabbedRenderer {
    options: RenderOptions,
}

impl TabbedRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }
}

impl Renderer for TabbedRenderer {
    fn name(&self) -> &'static str {
        "tabbed"
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
        html::page_start(&mut page, report, &[html::TABS_SCRIPT_SRC]);
        html::banner(&mut page, report);

        // Probe ids may contain '#', so panels are addressed by position
        page.push_str("<nav class=\"tabs\">\n");
        page.push_str("<button class=\"tab active\" data-panel=\"panel-summary\">Summary</button>\n");
        for (index, result) in report.results.iter().enumerate() {
            let state = if result.has_error_entry() { "failed" } else { "ok" };
            let _ = writeln!(
                page,
                "<button class=\"tab {}\" data-panel=\"panel-{}\">{}</button>",
                state,
                index,
                escape_html(result.probe())
            );
        }
        page.push_str("</nav>\n");

        page.push_str("<section class=\"panel active\" id=\"panel-summary\">\n");
        html::summary(&mut page, &report.summary());
        html::failures(&mut page, report);
        html::decorations(&mut page, &self.options, ctx);
        page.push_str("</section>\n");

        for (index, result) in report.results.iter().enumerate() {
            let _ = writeln!(page, "<section class=\"panel\" id=\"panel-{}\">", index);
            html::probe_result(&mut page, result);
            page.push_str("</section>\n");
        }
        html::page_end(&mut page);

        out.write_all(page.as_bytes())?;
        Ok(())
    }
}
