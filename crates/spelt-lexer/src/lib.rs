//! Spelt lexer: splits expression source into fragments, classifies them with
//! a recognizer chain and exposes the result through a [`TokenCursor`].

pub mod cursor;
pub mod lexer;
pub mod recognizer;
pub mod splitter;

pub use cursor::TokenCursor;
pub use lexer::{Lexer, LexerBuilder};
pub use recognizer::{
    core_recognizers, CompositeRecognizer, EnumRecognizer, FnRecognizer, IdentifierRecognizer,
    NumberRecognizer, Recognizer, StringRecognizer, TableRecognizer, BASIC_PRIORITY,
    IDENTIFIER_PRIORITY, LITERAL_PRIORITY, TEMPLATE_PRIORITY,
};
pub use splitter::{DefaultSplitter, Splitter};
