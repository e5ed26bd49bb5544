use crate::error::CompileError;

use super::ast::Step;
use super::filter;

/// Compile one token produced by the lexer into a [`Step`].
pub fn parse_token(token: &str) -> Result<Step, CompileError> {
    match token {
        "$" | "@" => return Ok(Step::Root),
        "*" => return Ok(Step::Wildcard),
        _ => {}
    }

    let Some(bracket) = token.find('[') else {
        return Ok(Step::Key(token.to_string()));
    };
    let key = match &token[..bracket] {
        "" => None,
        name => Some(name.to_string()),
    };
    let tail = &token[bracket..];
    if tail.len() < 3 {
        return Err(CompileError::BracketTooShort(token.to_string()));
    }
    if !tail.ends_with(']') {
        return Err(CompileError::UnclosedBracket(token.to_string()));
    }
    let body = &tail[1..tail.len() - 1];

    if body.contains('?') {
        parse_filter(key, body)
    } else if body.contains(':') {
        parse_range(key, body)
    } else if body == "*" {
        Ok(Step::Range {
            key,
            from: None,
            to: None,
        })
    } else {
        let indices = body
            .split(',')
            .map(|part| {
                parse_int(part).ok_or_else(|| CompileError::InvalidIndex(body.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Step::Index { key, indices })
    }
}

fn parse_filter(key: Option<String>, body: &str) -> Result<Step, CompileError> {
    let predicate = body
        .strip_prefix("?(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| CompileError::InvalidFilter(body.to_string()))?;
    Ok(Step::Filter {
        key,
        predicate: Box::new(filter::compile(predicate)?),
    })
}

fn parse_range(key: Option<String>, body: &str) -> Result<Step, CompileError> {
    let bounds: Vec<&str> = body.split(':').collect();
    let [from, to] = bounds.as_slice() else {
        return Err(CompileError::InvalidRange(body.to_string()));
    };
    let bound = |text: &str| -> Result<Option<i64>, CompileError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        parse_int(text)
            .map(Some)
            .ok_or_else(|| CompileError::InvalidIndex(body.to_string()))
    };
    Ok(Step::Range {
        key,
        from: bound(*from)?,
        to: bound(*to)?,
    })
}

fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}
