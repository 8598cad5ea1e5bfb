//! Binary feature vectors for chess positions and moves.
//!
//! A decision is presented to a network as the 256-bit board
//! encoding followed by the 28-bit encoding of one candidate move.

use chess::{Board, ChessMove, Color, MoveGen, Piece, ALL_SQUARES};

/// Length of a board encoding: 4 bits for each of the 64 squares.
pub const BOARD_ENCODING_LENGTH: usize = 256;
/// Length of a move encoding.
pub const MOVE_ENCODING_LENGTH: usize = 28;
/// Length of a full decision input.
pub const TOTAL_ENCODING_LENGTH: usize = BOARD_ENCODING_LENGTH + MOVE_ENCODING_LENGTH;

/// Read access to a chess position, as needed by the encoders.
/// Squares are indexed from a1 (`0`) to h8 (`63`).
pub trait BoardView {
    /// Returns the piece standing on a square, if any.
    fn piece_at(&self, square: usize) -> Option<(Piece, Color)>;
    /// Returns the side whose turn it is.
    fn side_to_move(&self) -> Color;
}

impl BoardView for Board {
    fn piece_at(&self, square: usize) -> Option<(Piece, Color)> {
        let square = *ALL_SQUARES.get(square)?;
        Some((self.piece_on(square)?, self.color_on(square)?))
    }

    fn side_to_move(&self) -> Color {
        Board::side_to_move(self)
    }
}

/// 3-bit code of a piece kind. Empty squares are `0b000`.
fn piece_code(piece: Piece) -> usize {
    match piece {
        Piece::Pawn => 0b001,
        Piece::Rook => 0b010,
        Piece::Knight => 0b011,
        Piece::Bishop => 0b100,
        Piece::Queen => 0b101,
        Piece::King => 0b110,
    }
}

/// Everything the move encoder needs to know about a move
/// in the context of the position it is played in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveView {
    pub from: usize,
    pub to: usize,
    pub is_capture: bool,
    pub is_en_passant: bool,
    pub is_castling: bool,
    /// Kind of the piece standing on the destination square.
    /// Empty for en passant captures.
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
}

impl MoveView {
    /// Derives a move's flags from the position it is played in.
    /// Returns `None` if no piece stands on the move's origin.
    pub fn new(
        board: &impl BoardView,
        from: usize,
        to: usize,
        promotion: Option<Piece>,
    ) -> Option<MoveView> {
        let (mover, _) = board.piece_at(from)?;
        let captured = board.piece_at(to).map(|(piece, _)| piece);
        let file_distance = (from % 8).abs_diff(to % 8);
        let is_en_passant = mover == Piece::Pawn && file_distance == 1 && captured.is_none();
        let is_castling = mover == Piece::King && file_distance == 2;
        Some(MoveView {
            from,
            to,
            is_capture: captured.is_some() || is_en_passant,
            is_en_passant,
            is_castling,
            captured,
            promotion,
        })
    }

    /// Describes a move played on a [`Board`].
    pub fn of(board: &Board, mv: ChessMove) -> Option<MoveView> {
        MoveView::new(
            board,
            mv.get_source().to_index(),
            mv.get_dest().to_index(),
            mv.get_promotion(),
        )
    }
}

fn push_bits(bits: &mut Vec<f64>, value: usize, width: u32) {
    for shift in (0..width).rev() {
        bits.push(((value >> shift) & 1) as f64);
    }
}

/// Encodes a piece as a color bit (1 for white) followed
/// by its 3-bit kind code. Absent pieces and colors encode as 0.
fn push_piece(bits: &mut Vec<f64>, piece: Option<Piece>, color: Option<Color>) {
    bits.push(if color == Some(Color::White) { 1.0 } else { 0.0 });
    push_bits(bits, piece.map_or(0, piece_code), 3);
}

/// Encodes every square from a1 to h8 as 4 bits.
pub fn encode_board_state(board: &impl BoardView) -> Vec<f64> {
    let mut bits = Vec::with_capacity(BOARD_ENCODING_LENGTH);
    for square in 0..64 {
        let piece = board.piece_at(square);
        push_piece(&mut bits, piece.map(|p| p.0), piece.map(|p| p.1));
    }
    bits
}

/// Encodes a move as origin file and rank, destination file and
/// rank (4 bits each), the capture, en passant, promotion and
/// castling flags, then the captured and promoted pieces.
///
/// Captured pieces are of the color not to move, promoted
/// pieces of the color to move.
pub fn encode_move(board: &impl BoardView, mv: &MoveView) -> Vec<f64> {
    let mut bits = Vec::with_capacity(MOVE_ENCODING_LENGTH);
    for value in [mv.from % 8, mv.from / 8, mv.to % 8, mv.to / 8] {
        push_bits(&mut bits, value, 4);
    }
    for flag in [
        mv.is_capture,
        mv.is_en_passant,
        mv.promotion.is_some(),
        mv.is_castling,
    ] {
        bits.push(if flag { 1.0 } else { 0.0 });
    }
    let side = board.side_to_move();
    push_piece(&mut bits, mv.captured, mv.is_capture.then(|| !side));
    push_piece(&mut bits, mv.promotion, mv.promotion.map(|_| side));
    bits
}

/// Encodes the decision of playing `mv` on `board`.
pub fn encode_decision(board: &impl BoardView, mv: &MoveView) -> Vec<f64> {
    let mut bits = encode_board_state(board);
    bits.extend(encode_move(board, mv));
    bits
}

/// Returns the legal moves of a position, in move generation order.
pub fn legal_moves(board: &Board) -> Vec<ChessMove> {
    MoveGen::new_legal(board).collect()
}

/// Returns every legal move of a position with the encoding
/// of the decision to play it.
pub fn candidate_inputs(board: &Board) -> Vec<(ChessMove, Vec<f64>)> {
    legal_moves(board)
        .into_iter()
        .filter_map(|mv| {
            let view = MoveView::of(board, mv)?;
            Some((mv, encode_decision(board, &view)))
        })
        .collect()
}

/// The board followed by an all-zero move.
pub fn null_move_input(board: &impl BoardView) -> Vec<f64> {
    let mut bits = encode_board_state(board);
    bits.resize(TOTAL_ENCODING_LENGTH, 0.0);
    bits
}

/// Input shown to a player before a puzzle starts: the null
/// move input with the first bit flipped, since the side to
/// move is the puzzle player's opponent.
pub fn puzzle_initial_input(board: &impl BoardView) -> Vec<f64> {
    let mut bits = null_move_input(board);
    bits[0] = 1.0 - bits[0];
    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::str::FromStr;

    fn bits(s: &str) -> Vec<f64> {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '1' { 1.0 } else { 0.0 })
            .collect()
    }

    fn view(fen: &str, uci: &str) -> (Board, MoveView) {
        let board = Board::from_str(fen).unwrap();
        let mv = legal_moves(&board)
            .into_iter()
            .find(|m| m.to_string() == uci)
            .unwrap();
        let view = MoveView::of(&board, mv).unwrap();
        (board, view)
    }

    #[test]
    fn starting_board() {
        let encoded = encode_board_state(&Board::default());
        assert_eq!(encoded.len(), BOARD_ENCODING_LENGTH);
        // a1 white rook, b1 white knight, c1 white bishop, d1 white queen, e1 white king.
        assert_eq!(encoded[..20], bits("1010 1011 1100 1101 1110")[..]);
        // a2 white pawn.
        assert_eq!(encoded[32..36], bits("1001")[..]);
        // a3 to h6 are empty.
        assert!(encoded[64..192].iter().all(|b| *b == 0.0));
        // a7 black pawn, a8 black rook.
        assert_eq!(encoded[192..196], bits("0001")[..]);
        assert_eq!(encoded[224..228], bits("0010")[..]);
    }

    #[test]
    fn quiet_move() {
        let (board, mv) = view(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "g1f3",
        );
        let encoded = encode_move(&board, &mv);
        assert_eq!(encoded.len(), MOVE_ENCODING_LENGTH);
        assert_eq!(encoded, bits("0110 0000 0101 0010 0000 0000 0000"));
    }

    #[test]
    fn capture_and_promotion() {
        // White pawn on g7 takes the black rook on h8 and promotes.
        let (board, mv) = view("4k2r/6P1/8/8/8/8/8/4K3 w - - 0 1", "g7h8q");
        assert!(mv.is_capture && !mv.is_en_passant && !mv.is_castling);
        assert_eq!(
            encode_move(&board, &mv),
            bits("0110 0110 0111 0111 1010 0010 1101")
        );
    }

    #[test]
    fn en_passant() {
        let (board, mv) = view("4k3/8/8/8/3Pp3/8/8/4K3 b - d3 0 1", "e4d3");
        assert!(mv.is_capture && mv.is_en_passant);
        assert_eq!(mv.captured, None);
        // The captured color is still encoded.
        assert_eq!(encode_move(&board, &mv)[16..24], bits("1100 1000")[..]);
    }

    #[test]
    fn castling_for_black() {
        let (board, mv) = view("r3k3/8/8/8/8/8/8/4K3 b q - 0 1", "e8c8");
        assert!(mv.is_castling && !mv.is_capture);
        assert_eq!(encode_move(&board, &mv)[16..20], bits("0001")[..]);
    }

    #[test]
    fn decision_and_puzzle_inputs() {
        let board = Board::default();
        // e2e4
        let mv = MoveView::new(&board, 12, 28, None).unwrap();
        assert_eq!(encode_decision(&board, &mv).len(), TOTAL_ENCODING_LENGTH);

        let initial = puzzle_initial_input(&board);
        assert_eq!(initial.len(), TOTAL_ENCODING_LENGTH);
        assert_eq!(initial[0], 0.0);
        assert_eq!(initial[1..BOARD_ENCODING_LENGTH], encode_board_state(&board)[1..]);
        assert!(initial[BOARD_ENCODING_LENGTH..].iter().all(|b| *b == 0.0));
    }

    #[test]
    fn candidates_of_a_position() {
        let board = Board::default();
        let candidates = candidate_inputs(&board);
        assert_eq!(candidates.len(), 20);
        let null = null_move_input(&board);
        assert!(null[BOARD_ENCODING_LENGTH..].iter().all(|b| *b == 0.0));
        for (mv, input) in &candidates {
            assert_eq!(input.len(), TOTAL_ENCODING_LENGTH);
            assert_eq!(input[..BOARD_ENCODING_LENGTH], null[..BOARD_ENCODING_LENGTH]);
            let view = MoveView::of(&board, *mv).unwrap();
            assert_eq!(input[BOARD_ENCODING_LENGTH..], encode_move(&board, &view)[..]);
        }

        // No moves once mated.
        let mated = Board::from_str("R6k/5ppp/8/8/8/8/5PPP/6K1 b - - 1 2").unwrap();
        assert!(candidate_inputs(&mated).is_empty());
    }

    #[test]
    fn empty_origin() {
        let board = Board::default();
        assert_eq!(MoveView::new(&board, 28, 36, None), None);
        assert_eq!(legal_moves(&board).len(), 20);
    }
}
