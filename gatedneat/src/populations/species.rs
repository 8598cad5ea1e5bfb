use crate::Organism;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Species identifier. Species are numbered
/// in order of appearance over the whole run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SpeciesID(pub usize);

impl fmt::Display for SpeciesID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "species {}", self.0)
    }
}

/// The surviving members of a species after culling,
/// which are the parents of the next generation.
///
/// Members are sorted by decreasing fitness, so
/// the first is the species' champion.
#[derive(Debug, Clone)]
pub struct Species {
    id: SpeciesID,
    members: Vec<Organism>,
    average_fitness: f64,
}

impl Species {
    /// Culls `members` down to the top `elite_percentage`,
    /// keeping at least two if there are two or more, and
    /// records the survivors' average fitness.
    ///
    /// Returns `None` if `members` is empty.
    ///
    /// # Examples
    /// ```
    /// use gatedneat::genomics::Genome;
    /// use gatedneat::populations::{Species, SpeciesID};
    /// use gatedneat::Organism;
    ///
    /// let members = (0..10)
    ///     .map(|i| {
    ///         let mut o = Organism::with_id(i, Genome::empty());
    ///         o.set_fitness(i as f64);
    ///         o
    ///     })
    ///     .collect();
    ///
    /// let species = Species::cull(SpeciesID(0), members, 0.3).unwrap();
    /// assert_eq!(species.members().len(), 3);
    /// assert_eq!(species.champion().fitness(), 9.0);
    /// assert_eq!(species.average_fitness(), 8.0);
    /// ```
    pub fn cull(id: SpeciesID, mut members: Vec<Organism>, elite_percentage: f64) -> Option<Species> {
        if members.is_empty() {
            return None;
        }
        members.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        let survivors = match members.len() {
            1 => 1,
            len => ((len as f64 * elite_percentage) as usize).clamp(2, len),
        };
        members.truncate(survivors);
        let average_fitness =
            members.iter().map(|o| o.fitness()).sum::<f64>() / members.len() as f64;
        Some(Species {
            id,
            members,
            average_fitness,
        })
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the surviving members, fittest first.
    pub fn members(&self) -> &[Organism] {
        &self.members
    }

    /// Returns the species' best member.
    pub fn champion(&self) -> &Organism {
        // Species are never empty.
        &self.members[0]
    }

    /// Returns the survivors' average fitness.
    pub fn average_fitness(&self) -> f64 {
        self.average_fitness
    }
}
