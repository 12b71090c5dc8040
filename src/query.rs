// Copyright 2026 Content Hub Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Search string parsing.
//!
//! A raw query is free text with optional type tokens: `@image`/`@i` and
//! `@text`/`@t`, matched case-insensitively and only as whole words. The
//! first token decides the type filter; every token is stripped from the
//! keyword.

use crate::model::ContentType;
use crate::model::SearchFilter;

// Longer words first so `@image` never stops at `i`.
const TYPE_WORDS: [(&str, ContentType); 4] = [
    ("image", ContentType::Image),
    ("text", ContentType::Text),
    ("i", ContentType::Image),
    ("t", ContentType::Text),
];

#[derive(Debug, Clone, Copy, PartialEq)]
struct TypeToken {
    start: usize,
    end: usize,
    content_type: ContentType,
}

/// Parse a raw search string. Never fails; anything that is not a type
/// token is kept as keyword text.
pub fn parse_query(query: &str) -> SearchFilter {
    let tokens = scan_type_tokens(query);
    let content_type = tokens.first().map(|t| t.content_type);

    let residual = if tokens.is_empty() {
        query.to_string()
    } else {
        strip_tokens(query, &tokens)
    };
    let keyword = collapse_whitespace(&residual);

    SearchFilter {
        keyword: (!keyword.is_empty()).then_some(keyword),
        content_type,
        categories: None,
        tags: None,
    }
}

fn scan_type_tokens(input: &str) -> Vec<TypeToken> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    while let Some(offset) = input[pos..].find('@') {
        let at = pos + offset;
        let word_start = at + 1;
        match match_type_word(&input[word_start..]) {
            Some((len, content_type)) => {
                tokens.push(TypeToken {
                    start: at,
                    end: word_start + len,
                    content_type,
                });
                pos = word_start + len;
            }
            None => pos = word_start,
        }
    }
    tokens
}

fn match_type_word(rest: &str) -> Option<(usize, ContentType)> {
    for (word, content_type) in TYPE_WORDS {
        let Some(head) = rest.get(..word.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(word) {
            continue;
        }
        let at_boundary = rest[word.len()..]
            .chars()
            .next()
            .is_none_or(|c| !is_word_char(c));
        if at_boundary {
            return Some((word.len(), content_type));
        }
    }
    None
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn strip_tokens(input: &str, tokens: &[TypeToken]) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for token in tokens {
        out.push_str(&input[last..token.start]);
        last = token.end;
    }
    out.push_str(&input[last..]);
    out
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
