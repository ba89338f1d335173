use std::collections::VecDeque;

use ndarray::ArrayView2;

/// Density-based clustering (DBSCAN) over a precomputed distance matrix.
///
/// Returns one label per point: `Some(cluster)` for points assigned to a
/// cluster, `None` for noise. A point is a core point when its
/// `eps`-neighborhood (including itself) contains at least `min_samples`
/// points; clusters grow from core points in ascending index order and
/// frontiers expand in ascending index order, so the labeling only depends
/// on the input values.
pub fn dbscan(distances: ArrayView2<'_, f64>, eps: f64, min_samples: usize) -> Vec<Option<usize>> {
    let n_points = distances.nrows();
    assert_eq!(distances.ncols(), n_points, "distance matrix must be square");

    let neighbors_of = |i: usize| -> Vec<usize> {
        (0..n_points).filter(|&j| distances[[i, j]] <= eps).collect()
    };

    let mut labels = vec![None; n_points];
    let mut visited = vec![false; n_points];
    let mut next_cluster = 0;

    for point in 0..n_points {
        if visited[point] {
            continue;
        }
        visited[point] = true;

        let neighbors = neighbors_of(point);
        if neighbors.len() < min_samples {
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[point] = Some(cluster);

        let mut queue = VecDeque::from(neighbors);
        while let Some(other) = queue.pop_front() {
            if labels[other].is_none() {
                labels[other] = Some(cluster);
            }

            if !visited[other] {
                visited[other] = true;
                let expansion = neighbors_of(other);
                if expansion.len() >= min_samples {
                    queue.extend(expansion);
                }
            }
        }
    }

    return labels;
}
