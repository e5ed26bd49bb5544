use serde_json::Value;
use tracing::trace;

use crate::error::EvalError;

use super::ast::{FilterExpr, Step};
use super::coerce::type_name;
use super::context::{Context, Node};

/// Deepest nesting of fan-outs and deep-scan levels a single walk may reach.
pub const MAX_DEPTH: usize = 512;

/// Outcome of applying one step.
#[derive(Debug)]
pub enum Found<'a> {
    One(Node<'a>),
    Many(Vec<Node<'a>>),
}

impl Found<'_> {
    pub fn into_value(self) -> Value {
        match self {
            Found::One(node) => node.value.clone(),
            Found::Many(nodes) => {
                Value::Array(nodes.into_iter().map(|n| n.value.clone()).collect())
            }
        }
    }
}

/// Read-only evaluation of `steps` against `input`, with `root` as the `$` of filters.
pub fn evaluate(steps: &[Step], input: &Value, root: &Value) -> Result<Value, EvalError> {
    let ctx = Context::reading(root);
    Ok(walk(&ctx, steps, Node::root(input), 0)?.into_value())
}

/// Apply `steps` in order from `node`.
///
/// Once a multi-result step has been applied, an array result that is not
/// final is fanned out: the remaining steps run against each container
/// element independently and the outputs are flattened.
pub fn walk<'a>(
    ctx: &Context<'a>,
    steps: &'a [Step],
    node: Node<'a>,
    depth: usize,
) -> Result<Found<'a>, EvalError> {
    if depth > MAX_DEPTH {
        return Err(EvalError::DepthExceeded(MAX_DEPTH));
    }

    let mut current = node;
    let mut multi = false;
    for (idx, step) in steps.iter().enumerate() {
        if !multi && !step.single_result() {
            multi = true;
        }

        let last = idx == steps.len() - 1;
        let found = apply(ctx, step, current, last, depth)?;
        let rest = &steps[idx + 1..];
        current = match found {
            Found::Many(nodes) if !last => return fan_out(ctx, rest, nodes, depth),
            Found::One(node) if multi && !last && node.value.is_array() => {
                let nodes = ctx.elements(&node);
                return fan_out(ctx, rest, nodes, depth);
            }
            Found::Many(nodes) => return Ok(Found::Many(nodes)),
            Found::One(node) => node,
        };
    }
    Ok(Found::One(current))
}

fn fan_out<'a>(
    ctx: &Context<'a>,
    rest: &'a [Step],
    nodes: Vec<Node<'a>>,
    depth: usize,
) -> Result<Found<'a>, EvalError> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        if !matches!(node.value, Value::Array(_) | Value::Object(_)) {
            continue;
        }
        match walk(ctx, rest, node, depth + 1)? {
            Found::Many(sub) => out.extend(sub),
            Found::One(sub) if sub.value.is_null() => {}
            Found::One(sub) if sub.value.is_array() => out.extend(ctx.elements(&sub)),
            Found::One(sub) => out.push(sub),
        }
    }
    Ok(Found::Many(out))
}

/// Deep scan: apply `step` here, then at every descendant.
fn descend<'a>(
    ctx: &Context<'a>,
    step: &'a Step,
    node: Node<'a>,
    terminal: bool,
    depth: usize,
    hits: &mut Vec<Node<'a>>,
) -> Result<(), EvalError> {
    if depth > MAX_DEPTH {
        return Err(EvalError::DepthExceeded(MAX_DEPTH));
    }
    match apply(ctx, step, node.clone(), terminal, depth)? {
        Found::Many(nodes) => hits.extend(nodes),
        Found::One(hit) if hit.value.is_null() => {}
        Found::One(hit) if hit.value.as_array().is_some_and(|a| !a.is_empty()) => {
            hits.extend(ctx.elements(&hit))
        }
        Found::One(hit) => hits.push(hit),
    }
    let children = ctx.children(&node);
    trace!(depth, children = children.len(), "deep scan");
    for child in children {
        descend(ctx, step, child, terminal, depth + 1, hits)?;
    }
    Ok(())
}

/// Apply a single step. `terminal` marks the step a replacement targets.
fn apply<'a>(
    ctx: &Context<'a>,
    step: &'a Step,
    node: Node<'a>,
    terminal: bool,
    depth: usize,
) -> Result<Found<'a>, EvalError> {
    match step {
        Step::Root => Ok(Found::One(node)),
        Step::Key(key) => Ok(Found::One(member(ctx, node, key, terminal))),
        Step::Index { key, indices } => {
            let base = prefixed(ctx, node, key.as_deref());
            index(ctx, base, indices, terminal)
        }
        Step::Range { key, from, to } => {
            let base = prefixed(ctx, node, key.as_deref());
            range(ctx, base, *from, *to, terminal)
        }
        Step::Wildcard => Ok(Found::Many(wildcard(ctx, node, terminal))),
        Step::Filter { key, predicate } => {
            let base = prefixed(ctx, node, key.as_deref());
            filter(ctx, base, predicate, terminal).map(Found::Many)
        }
        Step::Descend(target) => {
            let mut hits = Vec::new();
            descend(ctx, target, node, terminal, depth, &mut hits)?;
            Ok(Found::Many(hits))
        }
    }
}

fn prefixed<'a>(ctx: &Context<'a>, node: Node<'a>, key: Option<&'a str>) -> Node<'a> {
    match key {
        Some(key) => member(ctx, node, key, false),
        None => node,
    }
}

fn member<'a>(ctx: &Context<'a>, node: Node<'a>, key: &'a str, terminal: bool) -> Node<'a> {
    let Value::Object(map) = node.value else {
        return Node::null();
    };
    match map.get(key) {
        Some(v) => {
            let child = ctx.member(&node, key, v);
            if terminal {
                ctx.visit(&child);
            }
            child
        }
        None => Node::null(),
    }
}

/// Resolve a possibly negative position against `len`.
fn position(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 { len as i64 + index } else { index };
    (0..len as i64).contains(&resolved).then_some(resolved as usize)
}

fn index<'a>(
    ctx: &Context<'a>,
    node: Node<'a>,
    indices: &[i64],
    terminal: bool,
) -> Result<Found<'a>, EvalError> {
    let Value::Array(items) = node.value else {
        return Ok(match indices.len() {
            1 => Found::One(Node::null()),
            _ => Found::Many(Vec::new()),
        });
    };

    if let [single] = indices {
        let pos = position(*single, items.len()).ok_or(EvalError::IndexOutOfRange {
            index: *single,
            length: items.len(),
        })?;
        let child = ctx.element(&node, pos, &items[pos]);
        if terminal {
            ctx.visit(&child);
        }
        return Ok(Found::One(child));
    }

    let mut out = Vec::with_capacity(indices.len());
    for &requested in indices {
        let Some(pos) = position(requested, items.len()) else {
            continue;
        };
        let child = ctx.element(&node, pos, &items[pos]);
        if terminal {
            ctx.visit(&child);
        }
        if !child.value.is_null() {
            out.push(child);
        }
    }
    Ok(Found::Many(out))
}

fn range<'a>(
    ctx: &Context<'a>,
    node: Node<'a>,
    from: Option<i64>,
    to: Option<i64>,
    terminal: bool,
) -> Result<Found<'a>, EvalError> {
    let Value::Array(items) = node.value else {
        return Err(EvalError::RangeOnNonArray(type_name(node.value)));
    };
    let length = items.len();
    let len = length as i64;

    let start = match from {
        None => 0,
        Some(f) => {
            let start = if f < 0 { len + f } else { f };
            if start < 0 || start >= len {
                return Err(EvalError::RangeOutOfBounds {
                    bound: "from",
                    value: f,
                    length,
                });
            }
            start
        }
    };
    // a given `to` is inclusive
    let end = match to {
        None => len,
        Some(t) => {
            let end = if t < 0 { len + t } else { t };
            if end < -1 || end >= len {
                return Err(EvalError::RangeOutOfBounds {
                    bound: "to",
                    value: t,
                    length,
                });
            }
            end + 1
        }
    };

    let mut out = Vec::new();
    for pos in start.max(0) as usize..end.max(0) as usize {
        let child = ctx.element(&node, pos, &items[pos]);
        if terminal {
            ctx.visit(&child);
        }
        out.push(child);
    }
    Ok(Found::Many(out))
}

fn wildcard<'a>(ctx: &Context<'a>, node: Node<'a>, terminal: bool) -> Vec<Node<'a>> {
    let children = ctx.children(&node);
    if terminal {
        for child in &children {
            ctx.visit(child);
        }
    }
    children
}

fn filter<'a>(
    ctx: &Context<'a>,
    node: Node<'a>,
    predicate: &FilterExpr,
    terminal: bool,
) -> Result<Vec<Node<'a>>, EvalError> {
    let candidates = match node.value {
        Value::Array(_) => ctx.elements(&node),
        Value::Object(map) => map.iter().map(|(k, v)| ctx.member(&node, k, v)).collect(),
        _ => return Ok(Vec::new()),
    };
    let mut out = Vec::new();
    for candidate in candidates {
        if predicate.matches(candidate.value, ctx.root())? {
            if terminal {
                ctx.visit(&candidate);
            }
            out.push(candidate);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Compiled;
    use serde_json::json;

    fn run(path: &str, doc: &Value) -> Result<Value, EvalError> {
        Compiled::must_compile(path).lookup(doc)
    }

    fn store() -> Value {
        json!({
            "store": {
                "book": [
                    {"category": "reference", "author": "Nigel Rees", "title": "Sayings of the Century", "price": 8.95},
                    {"category": "fiction", "author": "Evelyn Waugh", "title": "Sword of Honour", "price": 12.99},
                    {"category": "fiction", "author": "Herman Melville", "title": "Moby Dick", "isbn": "0-553-21311-3", "price": 8.99},
                    {"category": "fiction", "author": "J. R. R. Tolkien", "title": "The Lord of the Rings", "isbn": "0-395-19395-8", "price": 22.99}
                ],
                "bicycle": {"color": "red", "price": 19.95}
            },
            "expensive": 10
        })
    }

    #[test]
    fn eval_nested_keys() {
        assert_eq!(run("$.store.bicycle.color", &store()).unwrap(), json!("red"));
    }

    #[test]
    fn eval_missing_key_is_null() {
        assert_eq!(run("$.missingKey", &json!({"a": 1})).unwrap(), Value::Null);
        assert_eq!(run("$.a.b.c", &json!({"a": 1})).unwrap(), Value::Null);
    }

    #[test]
    fn eval_key_on_array_is_null() {
        assert_eq!(run("$.a.b", &json!({"a": [1, 2]})).unwrap(), Value::Null);
    }

    #[test]
    fn eval_index_and_negative_index() {
        let doc = json!({"arr": ["x", "y", "z"]});
        assert_eq!(run("$.arr[0]", &doc).unwrap(), json!("x"));
        assert_eq!(run("$.arr[-1]", &doc).unwrap(), run("$.arr[2]", &doc).unwrap());
        assert_eq!(run("$.arr[-3]", &doc).unwrap(), json!("x"));
    }

    #[test]
    fn eval_single_index_out_of_range_errors() {
        let doc = json!(["x", "y"]);
        assert_eq!(
            run("$[5]", &doc),
            Err(EvalError::IndexOutOfRange { index: 5, length: 2 })
        );
        assert!(run("$[-3]", &doc).is_err());
    }

    #[test]
    fn eval_index_on_non_array_is_null() {
        assert_eq!(run("$.a[0]", &json!({"a": {"b": 1}})).unwrap(), Value::Null);
        assert_eq!(run("$.missing[0]", &json!({})).unwrap(), Value::Null);
    }

    #[test]
    fn eval_multi_index_drops_misses() {
        let doc = json!({"arr": ["a", null, "c"]});
        assert_eq!(run("$.arr[0,1,2,7]", &doc).unwrap(), json!(["a", "c"]));
        assert_eq!(run("$.arr[2,0]", &doc).unwrap(), json!(["c", "a"]));
    }

    #[test]
    fn eval_ranges() {
        let doc = json!({"l": ["a", "b", "c", "d"]});
        assert_eq!(run("$.l[1:]", &doc).unwrap(), json!(["b", "c", "d"]));
        assert_eq!(run("$.l[-2:]", &doc).unwrap(), json!(["c", "d"]));
        assert_eq!(run("$.l[:1]", &doc).unwrap(), json!(["a", "b"]));
        assert_eq!(run("$.l[1:2]", &doc).unwrap(), json!(["b", "c"]));
        assert_eq!(run("$.l[:-2]", &doc).unwrap(), json!(["a", "b", "c"]));
        assert_eq!(run("$.l[*]", &doc).unwrap(), json!(["a", "b", "c", "d"]));
        assert_eq!(run("$.l[:]", &doc).unwrap(), run("$.l[*]", &doc).unwrap());
        assert_eq!(run("$.l[3:1]", &doc).unwrap(), json!([]));
        // `to` is inclusive
        assert_eq!(run("$.l[:2]", &doc).unwrap(), json!(["a", "b", "c"]));
    }

    #[test]
    fn eval_range_errors() {
        let doc = json!({"l": ["a", "b"], "o": {"a": 1}});
        assert!(matches!(
            run("$.l[5:]", &doc),
            Err(EvalError::RangeOutOfBounds { bound: "from", .. })
        ));
        assert!(matches!(
            run("$.l[:4]", &doc),
            Err(EvalError::RangeOutOfBounds { bound: "to", .. })
        ));
        assert_eq!(
            run("$.l[0:9223372036854775807]", &doc),
            Err(EvalError::RangeOutOfBounds {
                bound: "to",
                value: i64::MAX,
                length: 2,
            })
        );
        assert!(matches!(
            run("$.l[0:-9223372036854775808]", &doc),
            Err(EvalError::RangeOutOfBounds { bound: "to", .. })
        ));
        assert_eq!(run("$.o[0:1]", &doc), Err(EvalError::RangeOnNonArray("object")));
        assert_eq!(run("$.nope[*]", &doc), Err(EvalError::RangeOnNonArray("null")));
    }

    #[test]
    fn eval_full_range_on_empty_array() {
        assert_eq!(run("$.l[*]", &json!({"l": []})).unwrap(), json!([]));
    }

    #[test]
    fn eval_wildcard_drops_nulls() {
        let doc = json!({"o": {"a": 1, "b": null, "c": 3}, "l": [null, 2]});
        assert_eq!(run("$.o.*", &doc).unwrap(), json!([1, 3]));
        assert_eq!(run("$.l.*", &doc).unwrap(), json!([2]));
        assert_eq!(run("$.o.a.*", &doc).unwrap(), json!([]));
    }

    #[test]
    fn eval_fan_out_flattens() {
        let doc = store();
        assert_eq!(
            run("$.store.book[*].author", &doc).unwrap(),
            json!(["Nigel Rees", "Evelyn Waugh", "Herman Melville", "J. R. R. Tolkien"])
        );
        assert_eq!(
            run("$.store.book[0:1].price", &doc).unwrap(),
            json!([8.95, 12.99])
        );
    }

    #[test]
    fn eval_fan_out_skips_missing_and_scalars() {
        let doc = json!({"items": [{"tag": "a"}, {"other": 1}, 5, {"tag": "b"}]});
        assert_eq!(run("$.items[*].tag", &doc).unwrap(), json!(["a", "b"]));
    }

    #[test]
    fn eval_fan_out_flattens_nested_arrays_once() {
        let doc = json!({"rows": [{"t": [1, 2]}, {"t": [3, [4]]}]});
        assert_eq!(run("$.rows[*].t", &doc).unwrap(), json!([1, 2, 3, [4]]));
    }

    #[test]
    fn eval_key_array_then_wildcard_fans_out_once_multi() {
        let doc = json!({"a": [{"b": [1, 2]}, {"b": [3]}]});
        assert_eq!(run("$.a.*.b", &doc).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn eval_recursive_descent_all_depths() {
        let doc = json!({"a": {"b": {"a": 1}}, "a2": 2});
        assert_eq!(run("$..a", &doc).unwrap(), json!([{"b": {"a": 1}}, 1]));
    }

    #[test]
    fn eval_recursive_descent_collects_authors() {
        assert_eq!(
            run("$..author", &store()).unwrap(),
            json!(["Nigel Rees", "Evelyn Waugh", "Herman Melville", "J. R. R. Tolkien"])
        );
    }

    #[test]
    fn eval_recursive_descent_from_inner_node() {
        let prices = run("$.store..price", &store()).unwrap();
        assert_eq!(prices, json!([8.95, 12.99, 8.99, 22.99, 19.95]));
    }

    #[test]
    fn eval_recursive_descent_flattens_array_matches() {
        let doc = json!({"x": {"book": [{"t": 1}, {"t": 2}]}});
        assert_eq!(run("$..book", &doc).unwrap(), json!([{"t": 1}, {"t": 2}]));
        assert_eq!(run("$..book.t", &doc).unwrap(), json!([1, 2]));
    }

    #[test]
    fn eval_recursive_descent_with_filter() {
        let titles = run("$..book[?(@.price < 10)].title", &store()).unwrap();
        assert_eq!(titles, json!(["Sayings of the Century", "Moby Dick"]));
    }

    #[test]
    fn eval_recursive_descent_wildcard() {
        let doc = json!({"a": {"b": 1}, "c": [2]});
        assert_eq!(
            run("$..*", &doc).unwrap(),
            json!([{"b": 1}, [2], 1, 2])
        );
    }

    #[test]
    fn eval_filter_exists() {
        let doc = json!({"items": [{"tag": "a"}, {"tag": null}, {"name": "x"}, {"tag": 0}]});
        assert_eq!(
            run("$.items[?(@.tag)]", &doc).unwrap(),
            json!([{"tag": "a"}, {"tag": 0}])
        );
    }

    #[test]
    fn eval_filter_numeric_coercion() {
        let doc = json!([{"p": 5}, {"p": "5"}, {"p": 10}]);
        assert_eq!(
            run("$[?(@.p < 10)]", &doc).unwrap(),
            json!([{"p": 5}, {"p": "5"}])
        );
    }

    #[test]
    fn eval_filter_against_root() {
        let titles = run("$.store.book[?(@.price < $.expensive)].title", &store()).unwrap();
        assert_eq!(titles, json!(["Sayings of the Century", "Moby Dick"]));
    }

    #[test]
    fn eval_filter_regex() {
        let authors = run("$.store.book[?(@.author =~ /.*REES/i)].author", &store()).unwrap();
        assert_eq!(authors, json!(["Nigel Rees"]));
    }

    #[test]
    fn eval_filter_over_object_values() {
        let doc = json!({"m": {"x": {"v": 1}, "y": {"v": 7}, "z": {"v": 3}}});
        assert_eq!(
            run("$.m[?(@.v >= 3)]", &doc).unwrap(),
            json!([{"v": 7}, {"v": 3}])
        );
    }

    #[test]
    fn eval_filter_no_match_and_non_container() {
        let doc = json!({"l": [{"v": 1}], "s": "text"});
        assert_eq!(run("$.l[?(@.v > 5)]", &doc).unwrap(), json!([]));
        assert_eq!(run("$.s[?(@.v > 5)]", &doc).unwrap(), json!([]));
    }

    #[test]
    fn eval_filter_root_is_document_after_fan_out() {
        let doc = json!({
            "limit": 2,
            "groups": [{"v": [{"n": 1}, {"n": 3}]}, {"v": [{"n": 2}]}]
        });
        assert_eq!(
            run("$.groups[*].v[?(@.n <= $.limit)].n", &doc).unwrap(),
            json!([1, 2])
        );
    }

    #[test]
    fn eval_root_step_is_identity() {
        let doc = json!({"a": {"b": 1}});
        assert_eq!(run("$.a.@.b", &doc).unwrap(), json!(1));
        assert_eq!(run("$.a.$", &doc).unwrap(), json!({"b": 1}));
    }

    #[test]
    fn eval_errors_fail_the_whole_call() {
        let doc = json!({"rows": [{"l": [1, 2, 3]}, {"l": [1]}]});
        assert!(run("$.rows[*].l[2]", &doc).is_err());
    }

    #[test]
    fn eval_is_repeatable() {
        let doc = store();
        let path = Compiled::must_compile("$.store.bicycle.price");
        assert_eq!(path.lookup(&doc).unwrap(), path.lookup(&doc).unwrap());
    }

    #[test]
    fn eval_depth_guard() {
        let mut doc = json!(1);
        for _ in 0..(MAX_DEPTH + 10) {
            doc = json!({ "n": doc });
        }
        assert_eq!(
            run("$..missing", &doc),
            Err(EvalError::DepthExceeded(MAX_DEPTH))
        );
    }
}
