use crate::types::Point;

/// 两点间欧氏距离
pub fn distance(p1: &Point, p2: &Point) -> f64 {
    ((p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2) + (p2.z - p1.z).powi(2)).sqrt()
}

/// 以 p2 为顶点、由 p1-p2-p3 构成的夹角（角度制，余弦定理）
/// 顶点与任一相邻点重合时返回 0
pub fn angle_between(p1: &Point, p2: &Point, p3: &Point) -> f64 {
    let a = distance(p2, p1);
    let b = distance(p2, p3);
    let c = distance(p3, p1);

    if a * b == 0.0 {
        return 0.0;
    }

    // 共线时浮点误差可能让余弦略超出 [-1, 1]
    let cos = ((a * a + b * b - c * c) / (2.0 * a * b)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
