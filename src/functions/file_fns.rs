//! File-metadata builtins.
//!
//! These consult the host's metadata for the file the expression is being
//! evaluated against. A file the host has no metadata for behaves as if
//! every lookup came back empty.

use super::FunctionContext;
use crate::engine::context::FileMetadata;
use crate::engine::errors::RuntimeError;
use crate::value::Value;

fn metadata(ctx: &dyn FunctionContext) -> Option<FileMetadata> {
    ctx.file_metadata(&ctx.file_path())
}

fn as_str(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// `inFolder(path)` — true when the file sits in the folder or anywhere
/// below it. Trailing slashes are insignificant.
pub(super) fn in_folder(args: &[Value], ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    let (Some(meta), Some(target)) = (metadata(ctx), as_str(&args[0])) else {
        return Ok(Value::Null);
    };
    let target = target.trim_end_matches('/');
    let folder = meta.folder.trim_end_matches('/');
    let matches = folder == target || folder.starts_with(&format!("{target}/"));
    Ok(Value::Bool(matches))
}

/// `hasExtension(ext)` — with or without the leading dot.
pub(super) fn has_extension(
    args: &[Value],
    ctx: &dyn FunctionContext,
) -> Result<Value, RuntimeError> {
    let (Some(meta), Some(ext)) = (metadata(ctx), as_str(&args[0])) else {
        return Ok(Value::Null);
    };
    let ext = ext.trim_start_matches('.');
    let actual = meta.path.rsplit('.').next().unwrap_or("");
    Ok(Value::Bool(
        !meta.path.ends_with('.') && meta.path.contains('.') && actual.eq_ignore_ascii_case(ext),
    ))
}

/// `hasTag(tag)` — leading `#` is insignificant on both sides.
pub(super) fn has_tag(args: &[Value], ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    let (Some(meta), Some(tag)) = (metadata(ctx), as_str(&args[0])) else {
        return Ok(Value::Null);
    };
    let tag = tag.trim_start_matches('#');
    Ok(Value::Bool(
        meta.tags.iter().any(|t| t.trim_start_matches('#') == tag),
    ))
}

pub(super) fn tags(_args: &[Value], ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match metadata(ctx) {
        Some(meta) => Ok(Value::List(
            meta.tags.into_iter().map(Value::String).collect(),
        )),
        None => Ok(Value::Null),
    }
}

pub(super) fn has_link(args: &[Value], ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    let (Some(meta), Some(target)) = (metadata(ctx), as_str(&args[0])) else {
        return Ok(Value::Null);
    };
    Ok(Value::Bool(meta.links.iter().any(|l| l == target)))
}

pub(super) fn backlinks(_args: &[Value], ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match metadata(ctx) {
        Some(meta) => Ok(Value::List(
            meta.backlinks.into_iter().map(Value::String).collect(),
        )),
        None => Ok(Value::Null),
    }
}

pub(super) fn outlinks(_args: &[Value], ctx: &dyn FunctionContext) -> Result<Value, RuntimeError> {
    match metadata(ctx) {
        Some(meta) => Ok(Value::List(
            meta.links.into_iter().map(Value::String).collect(),
        )),
        None => Ok(Value::Null),
    }
}
