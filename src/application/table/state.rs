//! Load lifecycle of a table: `Idle -> Loading -> Populated | Errored`.

/// Identifies one load; responses carrying an older ticket are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum TableState<T> {
    Idle,
    Loading(LoadTicket),
    Populated(Vec<T>),
    Errored(String),
}

/// Owns the current [`TableState`] and the ticket generation counter.
#[derive(Debug)]
pub struct TableLoader<T> {
    state: TableState<T>,
    generation: u64,
}

impl<T> Default for TableLoader<T> {
    fn default() -> Self {
        Self {
            state: TableState::Idle,
            generation: 0,
        }
    }
}

impl<T> TableLoader<T> {
    pub fn state(&self) -> &TableState<T> {
        &self.state
    }

    /// Starts a load, superseding any load still in flight.
    pub fn begin(&mut self) -> LoadTicket {
        self.generation += 1;
        let ticket = LoadTicket(self.generation);
        self.state = TableState::Loading(ticket);
        ticket
    }

    /// Re-enters `Loading` after a mutation.
    pub fn reload(&mut self) -> LoadTicket {
        self.begin()
    }

    /// Applies a response; returns `false` when the ticket is stale.
    pub fn finish<E: std::fmt::Display>(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<T>, E>,
    ) -> bool {
        if !matches!(self.state, TableState::Loading(current) if current == ticket) {
            return false;
        }
        self.state = match result {
            Ok(rows) => TableState::Populated(rows),
            Err(err) => TableState::Errored(err.to_string()),
        };
        true
    }

    pub fn rows(&self) -> &[T] {
        match &self.state {
            TableState::Populated(rows) => rows,
            _ => &[],
        }
    }

    pub fn rows_mut(&mut self) -> Option<&mut Vec<T>> {
        match &mut self.state {
            TableState::Populated(rows) => Some(rows),
            _ => None,
        }
    }
}

impl<T> TableState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading(_))
    }
}
