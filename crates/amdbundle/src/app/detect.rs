//! Definition-call detection by positional text search.
//!
//! A file counts as a module when its first definition token is followed, in order, by a
//! dependency array `[`, the literal `function`, and that function's opening `{`. Nothing is
//! parsed: tokens inside comments or strings are matched like any other text.

/// Byte offsets of a recognized anonymous definition call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSpan {
    /// Offset just past the definition token, where the identifier argument goes.
    pub after_token: usize,
    /// Offset of the dependency array's `[`.
    pub dependencies: usize,
    /// Offset of the `function` keyword.
    pub function: usize,
    /// Offset just past the callback's `{`.
    pub body_start: usize,
}

/// Why a file was not treated as a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TokenMissing,
    DependenciesMissing,
    FunctionMissing,
    BodyMissing,
    OutOfOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// A definition call without an identifier argument.
    Anonymous(CallSpan),
    /// The call already starts with a quoted identifier.
    Named { after_token: usize },
    NotAModule(Rejection),
}

/// Locate the first definition call in `text`.
pub fn detect_definition_call(text: &str, token: &str) -> Detection {
    if token.is_empty() {
        return Detection::NotAModule(Rejection::TokenMissing);
    }
    let Some(token_at) = text.find(token) else {
        return Detection::NotAModule(Rejection::TokenMissing);
    };
    let after_token = token_at + token.len();

    if text[after_token..]
        .trim_start()
        .starts_with(['\'', '"'])
    {
        return Detection::Named { after_token };
    }

    let Some(dependencies) = find_from(text, "[", after_token) else {
        return Detection::NotAModule(Rejection::DependenciesMissing);
    };
    let Some(function) = find_from(text, "function", after_token) else {
        return Detection::NotAModule(Rejection::FunctionMissing);
    };
    let Some(brace) = find_from(text, "{", function) else {
        return Detection::NotAModule(Rejection::BodyMissing);
    };

    let span = CallSpan {
        after_token,
        dependencies,
        function,
        body_start: brace + 1,
    };
    if span.is_ordered() {
        Detection::Anonymous(span)
    } else {
        Detection::NotAModule(Rejection::OutOfOrder)
    }
}

impl CallSpan {
    fn is_ordered(&self) -> bool {
        self.body_start > self.after_token
            && self.function > self.after_token
            && self.body_start > self.function
            && self.dependencies >= self.after_token
            && self.function > self.dependencies
    }
}

fn find_from(text: &str, needle: &str, from: usize) -> Option<usize> {
    text.get(from..)?.find(needle).map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "define(";

    #[test]
    fn detects_anonymous_call() {
        let text = "define(['a'], function (a) {\n    return a;\n});\n";
        let Detection::Anonymous(span) = detect_definition_call(text, TOKEN) else {
            panic!("expected a module");
        };
        assert_eq!(span.after_token, 7);
        assert_eq!(span.dependencies, 7);
        assert_eq!(&text[span.function..span.function + 8], "function");
        assert_eq!(&text[..span.body_start], "define(['a'], function (a) {");
    }

    #[test]
    fn missing_token_is_not_a_module() {
        assert_eq!(
            detect_definition_call("var x = [1]; function f() {}", TOKEN),
            Detection::NotAModule(Rejection::TokenMissing)
        );
    }

    #[test]
    fn empty_token_never_matches() {
        assert_eq!(
            detect_definition_call("define([], function () {});", ""),
            Detection::NotAModule(Rejection::TokenMissing)
        );
    }

    #[test]
    fn call_without_dependency_array_is_rejected() {
        assert_eq!(
            detect_definition_call("define(function () { return 1; });", TOKEN),
            Detection::NotAModule(Rejection::DependenciesMissing)
        );
    }

    #[test]
    fn bracket_after_function_is_out_of_order() {
        let text = "define(function () { var list = []; });";
        assert_eq!(
            detect_definition_call(text, TOKEN),
            Detection::NotAModule(Rejection::OutOfOrder)
        );
    }

    #[test]
    fn missing_function_or_body() {
        assert_eq!(
            detect_definition_call("define(['a'], factory);", TOKEN),
            Detection::NotAModule(Rejection::FunctionMissing)
        );
        assert_eq!(
            detect_definition_call("define(['a'], function", TOKEN),
            Detection::NotAModule(Rejection::BodyMissing)
        );
    }

    #[test]
    fn function_in_leading_comment_is_ignored() {
        let text = "// this function wraps a module\ndefine([], function () {\n});";
        assert!(matches!(
            detect_definition_call(text, TOKEN),
            Detection::Anonymous(_)
        ));
    }

    #[test]
    fn quoted_first_argument_is_named() {
        let text = "define('pkg/Mod', ['a'], function (a) {\n});";
        assert_eq!(
            detect_definition_call(text, TOKEN),
            Detection::Named { after_token: 7 }
        );
        let text = "define(\n  \"pkg/Mod\", [], function () {});";
        assert!(matches!(
            detect_definition_call(text, TOKEN),
            Detection::Named { .. }
        ));
    }

    #[test]
    fn custom_token() {
        let text = "require.def([], function () {});";
        assert!(matches!(
            detect_definition_call(text, "require.def("),
            Detection::Anonymous(_)
        ));
    }
}
