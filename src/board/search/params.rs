//! Tunable search parameters.
//!
//! Every constant a tuner may touch is a field of [`SearchParams`]. A copy is
//! handed to each worker, so differently tuned searches can run side by side.

/// One tunable as exposed through `setoption` and the `spsa` listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tunable {
    pub name: &'static str,
    pub value: i32,
    pub min: i32,
    pub max: i32,
}

impl Tunable {
    /// SPSA step size.
    #[must_use]
    pub fn step(&self) -> i32 {
        ((self.max - self.min) / 20).max(1)
    }
}

macro_rules! search_params {
    ($($field:ident: $default:expr, $min:expr, $max:expr;)*) => {
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct SearchParams {
            $(pub $field: i32,)*
        }

        impl Default for SearchParams {
            fn default() -> Self {
                SearchParams {
                    $($field: $default,)*
                }
            }
        }

        impl SearchParams {
            /// Set a tunable by name. Values are clamped to the tunable's
            /// range. Returns false for an unknown name.
            pub fn set(&mut self, name: &str, value: i32) -> bool {
                match name {
                    $(stringify!($field) => {
                        self.$field = value.clamp($min, $max);
                        true
                    })*
                    _ => false,
                }
            }

            #[must_use]
            pub fn get(&self, name: &str) -> Option<i32> {
                match name {
                    $(stringify!($field) => Some(self.$field),)*
                    _ => None,
                }
            }

            /// Every tunable with its current value and range.
            #[must_use]
            pub fn tunables(&self) -> Vec<Tunable> {
                vec![
                    $(Tunable {
                        name: stringify!($field),
                        value: self.$field,
                        min: $min,
                        max: $max,
                    },)*
                ]
            }
        }
    };
}

search_params! {
    // Quiet history
    mainhist_bonus_base: -50, -500, 500;
    mainhist_bonus_mult: 280, 1, 1000;
    mainhist_bonus_max: 2400, 100, 8000;
    mainhist_malus_base: 30, -500, 500;
    mainhist_malus_mult: 290, 1, 1000;
    mainhist_malus_max: 2200, 100, 8000;
    // History bonus for a singular TT move
    se_hist_base: 100, -500, 500;
    se_hist_mult: 150, 1, 1000;
    se_hist_max: 1500, 100, 8000;
    // Capture history
    capthist_bonus_base: 20, -500, 500;
    capthist_bonus_mult: 250, 1, 1000;
    capthist_bonus_max: 2200, 100, 8000;
    capthist_malus_base: 20, -500, 500;
    capthist_malus_mult: 250, 1, 1000;
    capthist_malus_max: 2200, 100, 8000;
    // Continuation history
    conthist_bonus_base: 40, -500, 500;
    conthist_bonus_mult: 260, 1, 1000;
    conthist_bonus_max: 2300, 100, 8000;
    conthist_malus_base: 40, -500, 500;
    conthist_malus_mult: 260, 1, 1000;
    conthist_malus_max: 2300, 100, 8000;
    // Whole-node pruning
    rfp_mult: 90, 10, 300;
    rfp_base: 20, -200, 200;
    rfp_improving_sub: 40, 0, 200;
    razor_mult: 250, 50, 600;
    razor_base: 300, 0, 800;
    nmp_offset: 20, -100, 200;
    nmp_div: 200, 50, 600;
    // Late move reductions
    lmr_div: 236, 100, 500;
    lmr_offset: 77, -100, 200;
    lmr_pv_add: 1024, 0, 3072;
    lmr_cutnode_add: 1024, 0, 3072;
    lmr_ttpv_sub: 1024, 0, 3072;
    lmr_improving_sub: 800, 0, 3072;
    lmr_corrplexity_sub: 700, 0, 3072;
    corrplexity_threshold: 80, 10, 400;
    lmr_killer_sub: 1024, 0, 3072;
    lmr_evalplexity_sub: 600, 0, 3072;
    evalplexity_threshold: 150, 10, 600;
    lmr_quiet_add: 300, 0, 3072;
    hist_lmr_div: 8000, 1000, 32000;
    do_deeper_margin: 40, 0, 200;
    // Move-loop pruning
    lmp_base: 300, 0, 1000;
    lmp_mult: 100, 10, 400;
    hp_base: 0, -4096, 4096;
    hp_mult: 2048, 0, 8192;
    pvs_see_quiet_base: 20, -200, 200;
    pvs_see_quiet_mult: 60, 0, 200;
    pvs_see_noisy_base: 10, -200, 200;
    pvs_see_noisy_mult: 25, 0, 200;
    pvs_see_hist_div: 90, 10, 500;
    qs_see_margin: -30, -300, 300;
    // Extensions
    double_ext_margin: 20, 0, 200;
    // Aspiration windows
    asp_delta: 30, 5, 200;
    // Correction history weights
    corr_pawn_weight: 180, 0, 512;
    corr_nonpawn_weight: 150, 0, 512;
    corr_minor_weight: 140, 0, 512;
    // Move ordering
    see_ordering_pvs: -100, -500, 500;
    see_ordering_qs: 0, -500, 500;
    // Static exchange piece values
    see_pawn: 100, 50, 200;
    see_knight: 300, 150, 500;
    see_bishop: 300, 150, 500;
    see_rook: 500, 300, 800;
    see_queen: 900, 600, 1400;
}

impl SearchParams {
    /// Piece values for static exchange evaluation, indexed by piece.
    #[must_use]
    pub fn see_values(&self) -> [i32; 6] {
        [
            self.see_pawn,
            self.see_knight,
            self.see_bishop,
            self.see_rook,
            self.see_queen,
            0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_by_name() {
        let mut params = SearchParams::default();
        assert!(params.set("rfp_mult", 120));
        assert_eq!(params.rfp_mult, 120);
        assert_eq!(params.get("rfp_mult"), Some(120));
        assert!(!params.set("no_such_param", 1));
        assert_eq!(params.get("no_such_param"), None);
    }

    #[test]
    fn test_set_clamps_to_range() {
        let mut params = SearchParams::default();
        params.set("asp_delta", 100_000);
        assert_eq!(params.asp_delta, 200);
    }

    #[test]
    fn test_tunables_listing() {
        let params = SearchParams::default();
        let tunables = params.tunables();
        assert!(tunables.iter().any(|t| t.name == "lmr_div" && t.value == 236));
        for t in &tunables {
            assert!(t.min <= t.value && t.value <= t.max, "{} out of range", t.name);
            assert!(t.step() >= 1);
        }
    }

    #[test]
    fn test_see_values_default() {
        assert_eq!(SearchParams::default().see_values(), [100, 300, 300, 500, 900, 0]);
    }
}
