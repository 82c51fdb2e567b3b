//! Span-based rewrites against the original source text.
//!
//! A [`TextEdit`] replaces one byte span with a template made of literal text
//! and slots that re-render other source spans. Rendering a slot applies every
//! edit nested inside it, so an outer rewrite (for example an assertion turned
//! into `expect(..)`) keeps the rewrites of its arguments.

use crate::error::CodemodError;
use crate::span::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPart {
    Text(String),
    Source(Span),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub span: Span,
    pub parts: Vec<EditPart>,
}

impl TextEdit {
    pub fn replace(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            parts: vec![EditPart::Text(text.into())],
        }
    }

    pub fn delete(span: Span) -> Self {
        Self {
            span,
            parts: Vec::new(),
        }
    }
}

/// Builder for [`EditPart`] sequences.
#[derive(Debug, Default)]
pub struct Template {
    parts: Vec<EditPart>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: &str) -> Self {
        match self.parts.last_mut() {
            Some(EditPart::Text(existing)) => existing.push_str(text),
            _ => self.parts.push(EditPart::Text(text.to_string())),
        }
        self
    }

    pub fn source(mut self, span: Span) -> Self {
        self.parts.push(EditPart::Source(span));
        self
    }

    pub fn finish(self, span: Span) -> TextEdit {
        TextEdit {
            span,
            parts: self.parts,
        }
    }
}

#[derive(Debug)]
pub struct ChangeSet<'s> {
    source: &'s str,
    edits: Vec<TextEdit>,
}

impl<'s> ChangeSet<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Records an edit. A second edit on an identical span is ignored; partial overlaps are rejected.
    pub fn push(&mut self, edit: TextEdit) -> Result<(), CodemodError> {
        for existing in &self.edits {
            if existing.span == edit.span {
                return Ok(());
            }
            if existing.span.partially_overlaps(edit.span) {
                return Err(CodemodError::ConflictingEdits {
                    first: existing.span,
                    second: edit.span,
                });
            }
        }

        self.edits.push(edit);
        Ok(())
    }

    /// Replaces `span` with `text`, skipping the edit when the text is already there.
    pub fn replace(&mut self, span: Span, text: &str) -> Result<(), CodemodError> {
        if self.source.get(span.start..span.end) == Some(text) {
            return Ok(());
        }
        self.push(TextEdit::replace(span, text))
    }

    pub fn delete(&mut self, span: Span) -> Result<(), CodemodError> {
        if span.is_empty() {
            return Ok(());
        }
        self.push(TextEdit::delete(span))
    }

    /// Deletes a statement. When it is alone on its line, the whole line goes with it.
    pub fn delete_statement(&mut self, span: Span) -> Result<(), CodemodError> {
        let span = self.statement_line_span(span);
        self.delete(span)
    }

    /// Deletes a statement together with the blank lines that follow it.
    pub fn delete_statement_and_trailing_blank_lines(
        &mut self,
        span: Span,
    ) -> Result<(), CodemodError> {
        let mut span = self.statement_line_span(span);
        if span.end == 0 || self.source.as_bytes().get(span.end - 1) == Some(&b'\n') {
            while let Some(next) = self.blank_line_at(span.end) {
                span.end = next;
            }
        }
        self.delete(span)
    }

    /// Produces the rewritten text.
    pub fn render(&self) -> String {
        let mut ordered = self.edits.iter().collect::<Vec<_>>();
        ordered.sort_by(|left, right| {
            left.span
                .start
                .cmp(&right.span.start)
                .then(right.span.end.cmp(&left.span.end))
        });

        let mut output = String::with_capacity(self.source.len());
        let whole = Span {
            start: 0,
            end: self.source.len(),
        };
        self.render_span(whole, None, &ordered, &mut output);
        output
    }

    fn render_span(
        &self,
        span: Span,
        owner: Option<&TextEdit>,
        ordered: &[&TextEdit],
        output: &mut String,
    ) {
        let mut cursor = span.start;

        for edit in ordered {
            if !span.contains(edit.span) || edit.span.start < cursor {
                continue;
            }
            if owner.is_some_and(|owner| std::ptr::eq(owner, *edit)) {
                continue;
            }

            output.push_str(&self.source[cursor..edit.span.start]);
            for part in &edit.parts {
                match part {
                    EditPart::Text(text) => output.push_str(text),
                    EditPart::Source(inner) => self.render_span(*inner, Some(edit), ordered, output),
                }
            }
            cursor = edit.span.end;
        }

        output.push_str(&self.source[cursor..span.end]);
    }

    fn statement_line_span(&self, span: Span) -> Span {
        let bytes = self.source.as_bytes();

        let mut start = span.start;
        while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
            start -= 1;
        }
        let at_line_start = start == 0 || bytes[start - 1] == b'\n';

        let mut end = span.end;
        while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
            end += 1;
        }
        let line_end = match bytes.get(end) {
            Some(b'\n') => Some(end + 1),
            Some(b'\r') if bytes.get(end + 1) == Some(&b'\n') => Some(end + 2),
            None => Some(end),
            Some(_) => None,
        };

        match (at_line_start, line_end) {
            (true, Some(line_end)) => Span {
                start,
                end: line_end,
            },
            _ => span,
        }
    }

    /// End offset of the whitespace-only line starting at `offset`, if there is one.
    fn blank_line_at(&self, offset: usize) -> Option<usize> {
        let bytes = self.source.as_bytes();
        let mut cursor = offset;
        while cursor < bytes.len() && matches!(bytes[cursor], b' ' | b'\t' | b'\r') {
            cursor += 1;
        }
        match bytes.get(cursor) {
            Some(b'\n') => Some(cursor + 1),
            _ => None,
        }
    }
}
