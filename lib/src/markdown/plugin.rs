use std::borrow::Cow;

use pulldown_cmark::Event;

use crate::error::Result;

/// A stage of the markdown pipeline.
///
/// `preprocess` rewrites the source before parsing, `remap` transforms the
/// parsed event stream, and `finalize` runs once rendering is done. Plugins
/// compose as tuples: `(A, B)` preprocesses and remaps with `A`, then `B`.
pub trait Plugin {
    #[inline(always)]
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        Ok(Cow::Borrowed(input))
    }

    #[inline(always)]
    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        events
    }

    #[inline(always)]
    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Plugin for () { }

impl<A: Plugin, B: Plugin> Plugin for (A, B) {
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        match self.0.preprocess(input)? {
            Cow::Borrowed(input) => self.1.preprocess(input),
            Cow::Owned(input) => Ok(Cow::Owned(self.1.preprocess(&input)?.into_owned())),
        }
    }

    fn remap<'a, I>(&'a mut self, events: I) -> impl Iterator<Item = Event<'a>> + 'a
        where I: Iterator<Item = Event<'a>> + 'a
    {
        let (first, second) = self;
        second.remap(first.remap(events))
    }

    fn finalize(&mut self) -> Result<()> {
        self.0.finalize()?;
        self.1.finalize()
    }
}
