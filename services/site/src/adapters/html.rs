//! services/site/src/adapters/html.rs
//!
//! A minimal HTML renderer. It draws the shared page chrome (navigation,
//! notices, validation errors) and hands the page data to client-side
//! templates as an embedded JSON document.

use serde_json::json;
use std::fmt::Write;

use crate::web::view::{RenderError, View, ViewRenderer};

#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl ViewRenderer for HtmlRenderer {
    fn render(&self, view: &View) -> Result<String, RenderError> {
        let fail = |e: &dyn std::fmt::Display| RenderError {
            template: view.template.to_string(),
            reason: e.to_string(),
        };

        let payload = json!({
            "template": view.template,
            "form": view.form,
            "data": view.data,
        });
        // Keep the JSON from closing the script element early.
        let payload = serde_json::to_string(&payload)
            .map_err(|e| fail(&e))?
            .replace('<', "\\u003c");

        let mut html = String::new();
        let title = escape(&view.title);
        write!(
            html,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{} | CSE Motors</title>\n</head>\n<body>\n<header>\n<nav>\
             <a href=\"/\">Home</a>",
            title
        )
        .map_err(|e| fail(&e))?;

        match &view.account {
            Some(account) => write!(
                html,
                " <a href=\"/account/\">Welcome {}</a> <a href=\"/account/logout\">Logout</a>",
                escape(&account.first_name)
            ),
            None => write!(html, " <a href=\"/account/login\">My Account</a>"),
        }
        .map_err(|e| fail(&e))?;

        write!(html, "</nav>\n</header>\n<main data-template=\"{}\">\n<h1>{}</h1>\n", escape(view.template), title)
            .map_err(|e| fail(&e))?;

        if !view.notices.is_empty() {
            html.push_str("<ul class=\"notice\">\n");
            for notice in &view.notices {
                writeln!(html, "<li>{}</li>", escape(notice)).map_err(|e| fail(&e))?;
            }
            html.push_str("</ul>\n");
        }

        if !view.errors.is_empty() {
            html.push_str("<ul class=\"errors\">\n");
            for error in view.errors.iter() {
                writeln!(
                    html,
                    "<li data-field=\"{}\">{}</li>",
                    escape(&error.field),
                    escape(&error.message)
                )
                .map_err(|e| fail(&e))?;
            }
            html.push_str("</ul>\n");
        }

        write!(
            html,
            "<script type=\"application/json\" id=\"page-data\">{}</script>\n</main>\n</body>\n</html>\n",
            payload
        )
        .map_err(|e| fail(&e))?;
        Ok(html)
    }
}
