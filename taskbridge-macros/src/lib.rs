use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Runs an `async fn main` on a fresh `taskbridge::EventLoop`.
///
/// Accepts an optional `name = "..."` argument naming the loop.
///
/// ```rust,ignore
/// #[taskbridge::main(name = "worker")]
/// async fn main() {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let name = match loop_name(attr) {
        Ok(name) => name,
        Err(msg) => return compile_error(&msg),
    };

    remove_async(&mut tokens);

    let Some(pos) = body_position(&tokens) else {
        return compile_error("#[taskbridge::main] expects a function body");
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let mut builder = String::from("::taskbridge::EventLoopBuilder::new()");

    // The literal is spliced back as written, escapes included.
    if let Some(name) = name {
        builder.push_str(&format!(".name({name})"));
    }

    builder.push_str(".build()");

    let new_block = format!(
        "{{
            let event_loop = {};
            let output = event_loop
                .block_on(async move {{
                    {}
                }})
                .expect(\"#[taskbridge::main] must not run inside another event loop\");
            output
        }}",
        builder, block
    );

    replace_body(tokens, pos, new_block)
}

/// Runs an `async fn` test on a fresh `taskbridge::EventLoop`.
///
/// ```rust,ignore
/// #[taskbridge::test]
/// async fn resolves() {
///     assert_eq!(taskbridge::task::from_result(1).await.unwrap(), 1);
/// }
/// ```
#[proc_macro_attribute]
pub fn test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens = item.into_iter().collect::<Vec<_>>();

    remove_async(&mut tokens);

    let Some(pos) = body_position(&tokens) else {
        return compile_error("#[taskbridge::test] expects a function body");
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let new_block = format!(
        "{{
        let event_loop = ::taskbridge::EventLoopBuilder::new().name(\"test\").build();
        let output = event_loop
            .block_on(async move {{ {} }})
            .expect(\"#[taskbridge::test] must not run inside another event loop\");
        output
    }}",
        block
    );

    let body = replace_body(tokens, pos, new_block);

    let test_attr: TokenStream = "#[test]".parse().unwrap();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(body);

    result.into_iter().collect()
}

/// Parses the optional `name = "..."` argument of `#[taskbridge::main]`.
///
/// Returns the string literal token as written.
fn loop_name(attr: TokenStream) -> Result<Option<String>, String> {
    let tokens: Vec<TokenTree> = attr.into_iter().collect();

    match tokens.as_slice() {
        [] => Ok(None),
        [
            TokenTree::Ident(key),
            TokenTree::Punct(eq),
            TokenTree::Literal(value),
        ] if key.to_string() == "name" && eq.as_char() == '=' => {
            let value = value.to_string();

            if value.starts_with('"') || value.starts_with("r\"") || value.starts_with("r#") {
                Ok(Some(value))
            } else {
                Err(format!("#[taskbridge::main] expects a string name, found `{value}`"))
            }
        }
        _ => Err("#[taskbridge::main] only accepts `name = \"...\"`".to_owned()),
    }
}

/// Index of the function body, i.e. the last brace-delimited group.
fn body_position(tokens: &[TokenTree]) -> Option<usize> {
    tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
}

/// Drops the `async` keyword from the signature.
fn remove_async(tokens: &mut Vec<TokenTree>) {
    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }
}

fn replace_body(mut tokens: Vec<TokenTree>, pos: usize, body: String) -> TokenStream {
    let stream = match body.parse::<TokenStream>() {
        Ok(stream) => stream,
        Err(err) => return compile_error(&format!("taskbridge macro error: {err}")),
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));
    tokens.into_iter().collect()
}

fn compile_error(msg: &str) -> TokenStream {
    format!("compile_error!({:?});", msg).parse().unwrap()
}
