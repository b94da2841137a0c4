use serde_json::Value;
use winnow::ascii::space0;
use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::take_while;

use crate::error::{Error, Result};
use crate::graph_schema::StyleProps;

/// Parse a declaration list such as `fill:#f9f,stroke:#333,stroke-width:4px`.
pub fn parse_style(input: &str) -> Result<StyleProps> {
    let mut rest = input;
    let decls = declarations(&mut rest).map_err(|_| {
        let context = rest.trim();
        let context_display = if context.chars().count() > 40 {
            format!("{}...", context.chars().take(40).collect::<String>())
        } else {
            context.to_string()
        };
        Error::Style {
            input: input.to_string(),
            reason: format!("unexpected `{context_display}`"),
        }
    })?;

    let mut style = StyleProps::default();
    for (name, value) in decls {
        apply(&mut style, name, value).map_err(|reason| Error::Style {
            input: input.to_string(),
            reason,
        })?;
    }
    Ok(style)
}

fn apply(style: &mut StyleProps, name: &str, value: &str) -> std::result::Result<(), String> {
    match name {
        "fill" | "background" => style.fill = Some(value.to_string()),
        "stroke" => style.stroke = Some(value.to_string()),
        "stroke-width" | "strokeWidth" => style.stroke_width = Some(number(name, value)?),
        "stroke-dasharray" | "strokeDasharray" => {
            style.stroke_dasharray = Some(value.to_string())
        }
        "color" => style.color = Some(value.to_string()),
        "font-size" | "fontSize" => style.font_size = Some(number(name, value)?),
        "font-weight" | "fontWeight" => style.font_weight = Some(value.to_string()),
        "opacity" => style.opacity = Some(number(name, value)?),
        _ => {
            style
                .extra
                .insert(name.to_string(), Value::String(value.to_string()));
        }
    }
    Ok(())
}

fn number(name: &str, value: &str) -> std::result::Result<f64, String> {
    let number = value.strip_suffix("px").unwrap_or(value).trim_end();
    number
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("{name} expects a number, got `{value}`"))
}

fn declarations<'s>(input: &mut &'s str) -> winnow::Result<Vec<(&'s str, &'s str)>> {
    let mut decls = Vec::new();
    loop {
        space0.parse_next(input)?;
        while opt(separator).parse_next(input)?.is_some() {
            space0.parse_next(input)?;
        }
        if input.trim().is_empty() {
            *input = "";
            break;
        }
        decls.push(declaration.parse_next(input)?);
        space0.parse_next(input)?;
        if !input.is_empty() {
            separator.parse_next(input)?;
        }
    }
    Ok(decls)
}

fn separator(input: &mut &str) -> winnow::Result<()> {
    alt((",", ";", "\n", "\r")).void().parse_next(input)
}

fn declaration<'s>(input: &mut &'s str) -> winnow::Result<(&'s str, &'s str)> {
    let name = property_name.parse_next(input)?;
    space0.parse_next(input)?;
    ":".parse_next(input)?;
    space0.parse_next(input)?;
    let value = property_value.parse_next(input)?;
    Ok((name, value))
}

fn property_name<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '-' || c == '_').parse_next(input)
}

/// Value up to the next top-level separator. Separators inside parentheses
/// belong to the value.
fn property_value<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    let mut depth = 0usize;
    let mut end = input.len();
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' | ';' | '\n' | '\r' if depth == 0 => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    let (value, rest) = input.split_at(end);
    let value = value.trim();
    if value.is_empty() {
        return Err(winnow::error::ParserError::from_input(input));
    }
    *input = rest;
    Ok(value)
}
