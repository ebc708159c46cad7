use autumnus::{FormatterOption, Options, highlight, themes};
use iocraft::prelude::*;
use serde_json::Value;

use import_probe::driver::{ProbeReport, StageOutcome, StageReport};

#[derive(Default, Props)]
struct StatusIconProps {
    outcome: Option<StageOutcome>,
}

#[component]
fn StatusIcon(props: &StatusIconProps) -> impl Into<AnyElement<'static>> {
    match props.outcome {
        Some(StageOutcome::Succeeded(_)) => element! {
            Text (
                color: Color::Green,
                content: "◆"
            )
        }
        .into_any(),
        Some(StageOutcome::Failed(_)) => element! {
            Text (
                color: Color::Red,
                content: "▲"
            )
        }
        .into_any(),
        Some(StageOutcome::Skipped(_)) => element! {
            Text (
                color: Color::Reset,
                content: "◇"
            )
        }
        .into_any(),
        None => element! {
            Text (
                color: Color::Yellow,
                content: "❓"
            )
        }
        .into_any(),
    }
}

fn detail(outcome: &StageOutcome) -> &str {
    match outcome {
        StageOutcome::Succeeded(detail) => detail,
        StageOutcome::Failed(reason) | StageOutcome::Skipped(reason) => reason,
    }
}

#[derive(Default, Props)]
struct StageRowProps {
    report: Option<StageReport>,
}

#[component]
fn StageRow(props: &StageRowProps) -> impl Into<AnyElement<'static>> {
    let (name, detail) = props
        .report
        .as_ref()
        .map(|r| (r.stage.to_string(), detail(&r.outcome).to_string()))
        .unwrap_or_default();

    element! {
        View(flex_direction: FlexDirection::Column) {
            Text(content: "│")
            View(flex_direction: FlexDirection::Row) {
                StatusIcon(outcome: props.report.as_ref().map(|r| r.outcome.clone()))
                Text(weight: Weight::Bold, content: format!(" {}", name))
            }
            Text(content: format!("│ {}", detail))
        }
    }
}

#[derive(Default, Props)]
pub struct ProbeReportViewProps {
    pub base_url: String,
    pub stages: Vec<StageReport>,
    pub summary: String,
}

#[component]
pub fn ProbeReportView(props: &ProbeReportViewProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Column) {
            View(flex_direction: FlexDirection::Row) {
                Text(content: "┌ ")
                View(background_color: Color::Blue) {
                    Text(content: &props.base_url, color: Color::White)
                }
            }
            #(props.stages.clone().into_iter().map(|report| {
                element! {
                    StageRow(report: report)
                }
            }))
            Text(content: "│")
            View(flex_direction: FlexDirection::Row) {
                Text(content: "└ ")
                Text(content: &props.summary)
            }
        }
    }
}

#[component]
pub fn ConfigHeader() -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Column) {
            Text(weight: Weight::Bold, content: "import-probe configuration")
            Text(content: "Values are written to config.toml; the client secret goes to the OS keyring.")
        }
    }
}

#[derive(Default, Props)]
pub struct InputPromptProps {
    pub prompt: String,
    pub default: Option<String>,
    pub description: Option<String>,
}

#[component]
pub fn InputPrompt(props: &InputPromptProps) -> impl Into<AnyElement<'static>> {
    element! {
        View(flex_direction: FlexDirection::Column) {
            View(flex_direction: FlexDirection::Row) {
                Text(weight: Weight::Bold, content: &props.prompt)
                #(props.default.as_ref().map(|default| element! {
                    Text(content: format!(" [{}]", default), color: Color::Cyan)
                }))
            }
            #(props.description.as_ref().map(|description| element! {
                Text(content: description, color: Color::Yellow)
            }))
        }
    }
}

#[derive(Default, Props)]
pub struct MessageProps {
    pub message: String,
}

#[component]
pub fn ErrorMessage(props: &MessageProps) -> impl Into<AnyElement<'static>> {
    element! {
        Text(content: format!("▲ {}", props.message), color: Color::Red)
    }
}

#[component]
pub fn SuccessMessage(props: &MessageProps) -> impl Into<AnyElement<'static>> {
    element! {
        Text(content: format!("◆ {}", props.message), color: Color::Green)
    }
}

pub fn summarize(report: &ProbeReport) -> String {
    let (mut succeeded, mut failed, mut skipped) = (0, 0, 0);
    for stage in &report.stages {
        match stage.outcome {
            StageOutcome::Succeeded(_) => succeeded += 1,
            StageOutcome::Failed(_) => failed += 1,
            StageOutcome::Skipped(_) => skipped += 1,
        }
    }
    format!("{succeeded} succeeded, {failed} failed, {skipped} skipped")
}

fn highlight_json(body: &str) -> String {
    let pretty = serde_json::from_str::<Value>(body).and_then(|v| serde_json::to_string_pretty(&v));
    match pretty {
        Ok(pretty) => highlight(
            &pretty,
            Options {
                formatter: FormatterOption::Terminal {
                    theme: Some(
                        themes::get("ayu_light").expect("Syntax highlighting theme not found"),
                    ),
                },
                lang_or_file: Some("json"),
            },
        ),
        Err(_) => body.to_string(),
    }
}

pub fn print_report(report: &ProbeReport) {
    element!(ProbeReportView(
        base_url: report.base_url.to_string(),
        stages: report.stages.clone(),
        summary: summarize(report)
    ))
    .print();

    for stage in &report.stages {
        if let Some(body) = &stage.response_body {
            println!();
            println!("{} response:", stage.stage);
            println!("{}", highlight_json(body));
        }
    }
}
