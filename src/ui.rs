//! Interface de terminal do forecast-bot: spinner e saída colorida.
//!
//! Usa as crates `indicatif` para o spinner de progresso e `console` para
//! estilização com cores. O [`RunProgress`] acompanha visualmente uma
//! execução no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::RunFailure;
use crate::orchestrator::{Preview, RunOutcome, RunReport, StatusReport};

/// Indicador visual de progresso para uma execução no terminal.
///
/// Exibe um spinner animado enquanto a execução roda e mensagens
/// coloridas para sucesso (verde), falha (vermelho) e "nada a fazer" (amarelo).
pub struct RunProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl RunProgress {
    /// Inicia o spinner com a mensagem inicial.
    pub fn start(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Finaliza o spinner e exibe o resultado da execução.
    pub fn complete(&self, result: &Result<RunReport, RunFailure>) {
        self.pb.finish_and_clear();
        match result {
            Ok(report) => match &report.outcome {
                RunOutcome::NothingToDo { .. } => {
                    println!("  {} {}", self.yellow.apply_to("–"), report.outcome);
                }
                RunOutcome::Completed { .. } => {
                    println!("  {} {}", self.green.apply_to("✓"), report.outcome);
                }
            },
            Err(failure) => {
                println!("  {} {failure}", self.red.apply_to("✗"));
            }
        }
    }

    /// Finaliza o spinner sem imprimir nada.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }

    /// Imprime o relatório da execução em JSON.
    pub fn print_report(&self, report: &RunReport) {
        println!();
        println!("{}", self.green.apply_to("─── Run Report ───"));
        println!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_default()
        );
    }
}

/// Imprime o resultado do comando `status`.
pub fn print_status(status: &StatusReport) {
    let bold = Style::new().bold();
    let due = |flag: bool| {
        if flag {
            Style::new().green().apply_to("due")
        } else {
            Style::new().dim().apply_to("not due")
        }
    };

    let source = if status.persisted { "persisted" } else { "default" };
    println!("{} ({source})", bold.apply_to("State"));
    println!("  last post:  {}", status.state.last_post_time.to_rfc3339());
    println!("  last panel: {}", status.state.last_panel_time.to_rfc3339());

    println!("{}", bold.apply_to("Active rule"));
    match &status.rule {
        Some(rule) => {
            println!("  since: {}", rule.start.to_rfc3339());
            println!("  post:  {}", rule.post);
            println!("  panel: {}", rule.panel);
        }
        None => println!("  none yet"),
    }

    println!("{}", bold.apply_to("Decision"));
    println!("  post:  {}", due(status.decision.post));
    println!("  panel: {}", due(status.decision.panel));
}

/// Imprime o resultado do comando `preview`.
pub fn print_preview(preview: &Preview) {
    let header = Style::new().cyan().bold();
    println!("{}", header.apply_to("─── Post ───"));
    println!("{}", preview.post);
    println!("{}", header.apply_to("─── Panel ───"));
    println!("{}", preview.panel_table);
    println!();
    println!("*Last updated {}*", preview.panel_footer);
}
