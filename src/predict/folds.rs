use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::PipelineError;

pub fn assign_folds(rows: usize, folds: usize, seed: Option<u64>) -> Result<Vec<usize>, PipelineError> {
    if folds < 2 || rows < folds {
        return Err(PipelineError::TooFewRows { rows, folds });
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut order = (0..rows).collect::<Vec<_>>();
    order.shuffle(&mut rng);

    let base = rows / folds;
    let extra = rows % folds;
    let mut fold_of = vec![0; rows];
    let mut start = 0;
    for fold in 0..folds {
        let size = base + usize::from(fold < extra);
        for &row in &order[start..start + size] {
            fold_of[row] = fold;
        }
        start += size;
    }
    Ok(fold_of)
}
