pub enum Message {
    CreatingNail(usize),
    Baking,
    /// A synthesis step finished: `(step, budget, from, to)`.
    Computing(usize, usize, usize, usize),
    /// A stored edge was re-applied: `(edge, total)`.
    Replaying(usize, usize),
}

pub trait Verboser {
    fn verbose(&mut self, message: Message);
}

pub struct Silent;

impl Verboser for Silent {
    fn verbose(&mut self, _: Message) {}
}
