//! Exercise aggregate implementation.

use common::AggregateId;
use persistence::{Aggregate, DomainEvents, EventSource, HasDomainEvents};

use super::{
    ExerciseCreatedData, ExerciseError, ExerciseEvent, ExerciseType, ExerciseUpdatedData,
    MuscleGroup, MuscleGroupsChangedData,
};

/// An exercise in the gym's catalogue.
///
/// Muscle groups keep the order they were given in for display; two lists
/// holding the same groups are the same set as far as persistence is
/// concerned.
#[derive(Debug, Clone)]
pub struct Exercise {
    id: AggregateId,
    name: String,
    description: Option<String>,
    exercise_type: ExerciseType,
    muscle_groups: Vec<MuscleGroup>,
    events: DomainEvents<ExerciseEvent>,
}

impl Exercise {
    /// Creates a new exercise and raises `ExerciseCreated`.
    pub fn create(
        name: impl Into<String>,
        description: Option<String>,
        exercise_type: ExerciseType,
        muscle_groups: Vec<MuscleGroup>,
    ) -> Result<Self, ExerciseError> {
        ensure_distinct(&muscle_groups)?;

        let mut exercise = Self::restore(
            AggregateId::new(),
            name.into(),
            description,
            exercise_type,
            muscle_groups,
        );
        exercise.add_domain_event(ExerciseEvent::ExerciseCreated(ExerciseCreatedData {
            exercise_id: exercise.id,
            name: exercise.name.clone(),
            exercise_type,
            muscle_groups: exercise.muscle_groups.clone(),
        }));
        Ok(exercise)
    }

    /// Rebuilds an exercise from stored state. Raises no events.
    pub fn restore(
        id: AggregateId,
        name: String,
        description: Option<String>,
        exercise_type: ExerciseType,
        muscle_groups: Vec<MuscleGroup>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            exercise_type,
            muscle_groups,
            events: DomainEvents::new(),
        }
    }

    // Query methods

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn exercise_type(&self) -> ExerciseType {
        self.exercise_type
    }

    pub fn muscle_groups(&self) -> &[MuscleGroup] {
        &self.muscle_groups
    }

    /// Returns true if the exercise works the given muscle group.
    pub fn works(&self, group: MuscleGroup) -> bool {
        self.muscle_groups.contains(&group)
    }

    // Command methods

    /// Replaces name, description and type.
    ///
    /// Raises `ExerciseUpdated` only when something actually changed.
    pub fn update_details(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
        exercise_type: ExerciseType,
    ) {
        let name = name.into();
        if name == self.name
            && description == self.description
            && exercise_type == self.exercise_type
        {
            return;
        }

        self.name = name;
        self.description = description;
        self.exercise_type = exercise_type;
        self.add_domain_event(ExerciseEvent::ExerciseUpdated(ExerciseUpdatedData {
            exercise_id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            exercise_type,
        }));
    }

    /// Replaces the worked muscle groups.
    ///
    /// A reordering of the current groups is accepted for display but is not
    /// a change and raises nothing.
    pub fn change_muscle_groups(&mut self, groups: Vec<MuscleGroup>) -> Result<(), ExerciseError> {
        ensure_distinct(&groups)?;

        let unchanged = same_groups(&groups, &self.muscle_groups);
        let previous = std::mem::replace(&mut self.muscle_groups, groups);
        if !unchanged {
            self.add_domain_event(ExerciseEvent::MuscleGroupsChanged(MuscleGroupsChangedData {
                exercise_id: self.id,
                previous,
                current: self.muscle_groups.clone(),
            }));
        }
        Ok(())
    }
}

fn ensure_distinct(groups: &[MuscleGroup]) -> Result<(), ExerciseError> {
    for (i, group) in groups.iter().enumerate() {
        if groups[..i].contains(group) {
            return Err(ExerciseError::DuplicateMuscleGroup(*group));
        }
    }
    Ok(())
}

fn same_groups(a: &[MuscleGroup], b: &[MuscleGroup]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort();
    b.sort();
    a == b
}

impl HasDomainEvents for Exercise {
    type Event = ExerciseEvent;

    fn add_domain_event(&mut self, event: ExerciseEvent) {
        self.events.add(event);
    }

    fn pop_domain_events(&mut self) -> Vec<ExerciseEvent> {
        self.events.pop()
    }
}

impl Aggregate for Exercise {
    fn aggregate_type() -> &'static str {
        "Exercise"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn as_event_source(&mut self) -> Option<&mut dyn EventSource> {
        Some(self)
    }
}
