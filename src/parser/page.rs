use std::iter::FusedIterator;

use super::Role;
use crate::layout::{BlockResolver, ProblemLabel, TextQuery};

/// Problems of one page in number order, each already run through the
/// role's processor. Ends at the first number with no label on the page.
pub struct PageProblems<'a, Q: ?Sized> {
    query: &'a Q,
    role: Role,
    resolver: &'a BlockResolver,
    next_number: u32,
    done: bool,
}

pub fn extract_page<'a, Q: TextQuery + ?Sized>(
    query: &'a Q,
    role: Role,
    resolver: &'a BlockResolver,
) -> PageProblems<'a, Q> {
    PageProblems {
        query,
        role,
        resolver,
        next_number: 1,
        done: false,
    }
}

impl<Q: TextQuery + ?Sized> Iterator for PageProblems<'_, Q> {
    type Item = (u32, Option<String>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let number = self.next_number;
        let Some(bbox) = self.query.find_line(&format!("{}.", number)) else {
            self.done = true;
            return None;
        };

        let label = ProblemLabel { number, bbox };
        let raw = self.resolver.expand_to_block(&label, self.query);
        self.next_number += 1;
        Some((number, self.role.process(&raw, number)))
    }
}

impl<Q: TextQuery + ?Sized> FusedIterator for PageProblems<'_, Q> {}
