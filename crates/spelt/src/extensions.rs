//! Bundled extensions.

use spelt_lexer::{core_recognizers, EnumRecognizer, TEMPLATE_PRIORITY};
use spelt_parser::ParserRegistry;
use spelt_runtime::{
    default_binary_handlers, default_converters, default_functions, default_unary_handlers,
};
use spelt_syntax::token::TemplateToken;

use crate::extension::Extension;

/// The core grammar, operators, function library and conversions.
pub fn core() -> Extension {
    let grammar = ParserRegistry::new();
    let mut ext = Extension::new("core");
    for r in core_recognizers() {
        ext = ext.shared_recognizer(r);
    }
    for (construct, parser) in grammar.parsers() {
        ext = ext.shared_parser(construct, parser);
    }
    for op in grammar.binary_operators() {
        ext = ext.binary_operator(op.clone());
    }
    for op in grammar.prefix_operators() {
        ext = ext.prefix_operator(op.clone());
    }
    for op in grammar.postfix_operators() {
        ext = ext.postfix_operator(op.clone());
    }
    for h in default_binary_handlers() {
        ext = ext.binary_handler(h);
    }
    for h in default_unary_handlers() {
        ext = ext.unary_handler(h);
    }
    for f in default_functions() {
        ext = ext.overload(f);
    }
    for c in default_converters() {
        ext = ext.converter(c);
    }
    ext
}

/// Template keywords (`for in if else end`), recognized ahead of identifiers.
pub fn template() -> Extension {
    Extension::new("template").recognizer(EnumRecognizer::<TemplateToken>::new(TEMPLATE_PRIORITY))
}
