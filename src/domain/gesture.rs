//! Pointer gesture state machine for column resize and reorder.
//!
//! The machine knows nothing about any particular event model. Callers feed
//! it pointer-down, move and up transitions with an x coordinate in width
//! units and act on the returned [`GestureOutcome`].

/// Current pointer gesture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Resizing {
        column: String,
        start_x: i64,
        start_width: u32,
    },
    Dragging {
        column: String,
    },
}

/// What the caller should apply in response to a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    Resize {
        column: String,
        start_width: u32,
        delta_x: i64,
    },
    Reorder {
        dragged: String,
        target: String,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }

    /// Column the active gesture is attached to.
    pub fn column(&self) -> Option<&str> {
        match self {
            Gesture::Idle => None,
            Gesture::Resizing { column, .. } | Gesture::Dragging { column } => Some(column.as_str()),
        }
    }

    /// Pointer pressed on a column's resize handle. Any interrupted gesture
    /// is discarded.
    pub fn begin_resize(&mut self, column: impl Into<String>, x: i64, start_width: u32) {
        *self = Gesture::Resizing {
            column: column.into(),
            start_x: x,
            start_width,
        };
    }

    /// Pointer pressed on a column header.
    pub fn begin_drag(&mut self, column: impl Into<String>) {
        *self = Gesture::Dragging {
            column: column.into(),
        };
    }

    /// Pointer moved. Only a resize produces continuous output.
    pub fn pointer_move(&self, x: i64) -> Option<GestureOutcome> {
        match self {
            Gesture::Resizing {
                column,
                start_x,
                start_width,
            } => Some(GestureOutcome::Resize {
                column: column.clone(),
                start_width: *start_width,
                delta_x: x - start_x,
            }),
            _ => None,
        }
    }

    /// Pointer released at `x`, optionally over the header of `over`.
    ///
    /// Always returns the machine to [`Gesture::Idle`].
    pub fn pointer_up(&mut self, x: i64, over: Option<&str>) -> Option<GestureOutcome> {
        match std::mem::take(self) {
            Gesture::Idle => None,
            resizing @ Gesture::Resizing { .. } => resizing.pointer_move(x),
            Gesture::Dragging { column } => match over {
                Some(target) if target != column => Some(GestureOutcome::Reorder {
                    dragged: column,
                    target: target.to_string(),
                }),
                _ => None,
            },
        }
    }

    /// Abandons the gesture without producing any outcome.
    pub fn cancel(&mut self) {
        *self = Gesture::Idle;
    }
}
