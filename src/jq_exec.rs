//! Optional jq pre-filter: pull schema descriptions out of larger documents.
use anyhow::{anyhow, Context, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// Run `filter_src` over `input`; every output becomes one document.
pub fn run_jaq(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(|errs| {
        jq_error("parse", filter_src, errs.into_iter().map(|(_, err)| format!("{err:?}")))
    })?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| {
            let undefined = errs.into_iter().flat_map(|(_, list)| {
                list.into_iter().map(|(name, undef): (&str, Undefined)| format!("undefined `{name}` ({undef:?})"))
            });
            jq_error("compile", filter_src, undefined)
        })?;

    let inputs = RcIter::new(core::iter::empty());
    let mut it = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    while let Some(item) = it.next() {
        let v = item.map_err(|e| anyhow!("jq runtime error in `{filter_src}`: {e:?}"))?;
        // Val renders as JSON text
        let text = format!("{v}");
        let value = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("jq produced a non-JSON value: {text}"))?;
        out.push(value);
    }
    Ok(out)
}

/// Folds every jq diagnostic of one stage into a single error.
fn jq_error(stage: &str, filter_src: &str, messages: impl Iterator<Item = String>) -> anyhow::Error {
    let messages: Vec<String> = messages.collect();
    anyhow!("jq {stage} error in `{filter_src}`: {}", messages.join("; "))
}
