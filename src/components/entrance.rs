use log::debug;

use crate::page::{Intersection, ObserverOptions, Page};

pub const ANIMATED_SELECTOR: &str = ".card, .contact-item, .stat-item";
pub const REVEALED_CLASS: &str = "animate-in";

pub const OBSERVER_OPTIONS: ObserverOptions = ObserverOptions {
    threshold: 0.1,
    root_margin: "0px 0px -50px 0px",
};

/// Elements still waiting for their entrance. Only ever shrinks.
#[derive(Debug, Clone)]
pub struct RevealSet<E> {
    pending: Vec<E>,
}

impl<E: PartialEq> RevealSet<E> {
    pub fn new(targets: Vec<E>) -> Self {
        Self { pending: targets }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Takes every intersecting entry that is still pending out of the set.
    pub fn reveal(&mut self, entries: Vec<Intersection<E>>) -> Vec<E> {
        entries
            .into_iter()
            .filter(|entry| entry.intersecting)
            .filter_map(|entry| {
                let index = self.pending.iter().position(|p| *p == entry.target)?;
                Some(self.pending.remove(index))
            })
            .collect()
    }
}

/// Starts watching the animated elements; returns how many were found.
pub fn install<P: Page>(page: &P) -> usize {
    let targets = page.query_all(ANIMATED_SELECTOR);
    let count = targets.len();
    if count == 0 {
        return 0;
    }
    let mut set = RevealSet::new(targets.clone());
    let handler_page = page.clone();
    page.watch_intersections(
        &OBSERVER_OPTIONS,
        &targets,
        Box::new(move |entries: Vec<Intersection<P::Element>>| {
            let revealed = set.reveal(entries);
            for element in &revealed {
                handler_page.add_class(element, REVEALED_CLASS);
            }
            if !revealed.is_empty() {
                debug!("revealed {}, {} still hidden", revealed.len(), set.remaining());
            }
            revealed
        }),
    );
    count
}
